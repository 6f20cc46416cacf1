//! Subprocess bridge to the numpy reference implementations.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const PY_REFERENCE_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np
import scipy.signal

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

def _as_array(key):
    return np.asarray(p[key], dtype=float)

def _flat(v):
    return np.asarray(v, dtype=float).reshape(-1)

def _wavenumbers(n, length):
    return 2 * np.pi * np.fft.fftfreq(n, length / n)

def _partials(x, y):
    n = x.size
    A = np.fft.fft(x + 1j * y, n)
    k = np.arange(n)
    S = np.zeros((n, n), dtype=complex)
    for m in range(n):
        S[:, m] = A * np.exp(2 * np.pi * 1j * m * k / n) / n
    return S

def _compute():
    if op == "convolve":
        return np.convolve(_as_array("in1"), _as_array("in2"), mode=p["mode"])
    if op == "fftconvolve":
        return scipy.signal.fftconvolve(_as_array("in1"), _as_array("in2"), mode=p["mode"])
    if op == "spectral_derivative_1d":
        f = _as_array("f")
        k = _wavenumbers(f.size, float(p["length"]))
        return np.real(np.fft.ifft(1j * k * np.fft.fft(f)))
    if op == "spectral_derivative_2d":
        f = _as_array("f").reshape((int(p["rows"]), int(p["cols"])))
        ny, nx = f.shape
        KX, KY = np.meshgrid(_wavenumbers(nx, float(p["lx"])), _wavenumbers(ny, float(p["ly"])))
        K = KX if p["axis"] == "x" else KY
        return np.real(np.fft.ifft2(1j * K * np.fft.fft2(f)))
    if op == "dft_partials":
        S = _partials(_as_array("x"), _as_array("y"))
        return np.concatenate([S.real.reshape(-1), S.imag.reshape(-1)])
    if op == "epicycle_frame":
        S = _partials(_as_array("x"), _as_array("y"))
        col = S[:, int(p["m"])]
        U, V = col.real, col.imag
        X = np.append(0, np.cumsum(U))[:-1]
        Y = np.append(0, np.cumsum(V))[:-1]
        return np.concatenate([U, V, X, Y])

    raise RuntimeError(f"unsupported op: {op}")

y = _flat(_compute())

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": y.tolist(),
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__,
    "scipy_version": scipy.__version__,
    "matplotlib_version": None
}))
"#;

const PY_VERSION_SCRIPT: &str = r#"
import json, sys
import numpy
import scipy
import matplotlib
payload = json.loads(sys.stdin.read())
print(json.dumps({
    "output": [],
    "avg_ns": 0.0,
    "python_version": sys.version.split()[0],
    "numpy_version": numpy.__version__,
    "scipy_version": scipy.__version__,
    "matplotlib_version": matplotlib.__version__
}))
"#;

/// Output and timing of one reference evaluation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PythonEval {
    pub output: Vec<f64>,
    pub avg_ns: f64,
    pub python_version: String,
    pub numpy_version: String,
    pub scipy_version: Option<String>,
    pub matplotlib_version: Option<String>,
}

pub fn python_versions(python_bin: &Path) -> Result<PythonEval> {
    run_python_json(python_bin, PY_VERSION_SCRIPT, &json!({}))
}

/// Evaluate `op` in numpy, timing `iters` repetitions after the first call.
pub fn reference_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    tracing::debug!(op, iters, "numpy reference");
    run_python_json(
        python_bin,
        PY_REFERENCE_SCRIPT,
        &json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
    .with_context(|| format!("evaluating numpy reference for `{op}`"))
}

/// Run `script` with `payload` as JSON on stdin and parse its stdout as JSON.
pub fn run_python_json<T>(python_bin: &Path, script: &str, payload: &serde_json::Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let stdout = run_python(python_bin, script, payload)?;
    serde_json::from_str(stdout.trim()).context("parsing python json")
}

/// Run `script` with `payload` as JSON on stdin, returning stdout.
pub fn run_python(python_bin: &Path, script: &str, payload: &serde_json::Value) -> Result<String> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    String::from_utf8(output.stdout).context("parsing python stdout utf8")
}
