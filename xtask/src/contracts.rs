//! Parity contracts: every kernel against its numpy reference.

use crate::python::{python_versions, reference_eval, run_python, PythonEval};
use anyhow::{anyhow, bail, Context, Result};
use fourier::kernel::KernelLifecycle;
use fourier::num_rs::{convolve as direct_convolve, ConvolveMode as DirectMode};
use fourier::plot::python_interpreter;
use fourier::signal::convolve::{ConvolveConfig, ConvolveKernel, ConvolveMode};
use fourier::signal::derivative::{
    periodic_grid, SpectralDerivativeConfig, SpectralDerivativeKernel, SpectralGradientConfig,
    SpectralGradientKernel,
};
use fourier::signal::epicycles::{dft_partials, Epicycles};
use fourier::signal::traits::{Convolve1D, Derivative1D, Gradient2D};
use fourier::signal::wave::{hat, lissajous, theta_grid, LissajousConfig};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
    rust_candidate_ns: f64,
    rust_baseline_ns: f64,
    python_ns: f64,
    speedup_vs_baseline: f64,
    speedup_vs_python: f64,
    overlay_plot: String,
    residual_plot: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    scipy_version: String,
    matplotlib_version: String,
    rows: Vec<ContractRow>,
}

/// Candidate, baseline and reference outputs of one case, plus timings.
struct CaseRun {
    candidate: Vec<f64>,
    baseline: Vec<f64>,
    reference: PythonEval,
    candidate_ns: f64,
    baseline_ns: f64,
}

/// Accumulates rows and the plot payload shared by every case.
struct Recorder {
    plots_dir: PathBuf,
    rows: Vec<ContractRow>,
    plot_payload: Vec<serde_json::Value>,
}

impl Recorder {
    fn record(&mut self, case_id: &str, run: CaseRun) -> Result<()> {
        ensure_same_length(case_id, &run.candidate, &run.baseline)?;
        ensure_same_length(case_id, &run.candidate, &run.reference.output)?;

        let overlay = self.plots_dir.join(format!("{case_id}_overlay.png"));
        let residual = self.plots_dir.join(format!("{case_id}_residual.png"));
        let metrics = Metrics::between(&run.candidate, &run.reference.output);
        tracing::info!(
            case_id,
            max_abs = metrics.max_abs,
            pearson_r = metrics.pearson_r,
            "contract case"
        );

        self.rows.push(ContractRow {
            case_id: case_id.to_string(),
            pearson_r: metrics.pearson_r,
            mae: metrics.mae,
            rmse: metrics.rmse,
            max_abs: metrics.max_abs,
            rust_candidate_ns: run.candidate_ns,
            rust_baseline_ns: run.baseline_ns,
            python_ns: run.reference.avg_ns,
            speedup_vs_baseline: run.baseline_ns / run.candidate_ns,
            speedup_vs_python: run.reference.avg_ns / run.candidate_ns,
            overlay_plot: overlay.to_string_lossy().into_owned(),
            residual_plot: residual.to_string_lossy().into_owned(),
        });
        self.plot_payload.push(json!({
            "case_id": case_id,
            "rust_candidate": run.candidate,
            "python_reference": run.reference.output,
            "overlay_plot": overlay.to_string_lossy(),
            "residual_plot": residual.to_string_lossy()
        }));
        Ok(())
    }
}

pub fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    let plots_dir = out_dir.join("plots");
    fs::create_dir_all(&plots_dir).context("creating contract output directories")?;

    let python_bin = PathBuf::from(python_interpreter());
    tracing::info!(python = %python_bin.display(), out = %out_dir.display(), "running contracts");
    let mut recorder = Recorder {
        plots_dir: plots_dir.clone(),
        rows: Vec::new(),
        plot_payload: Vec::new(),
    };

    // Shared synthetic input for the 1D cases.
    let signal: Vec<f64> = (0..512)
        .map(|i| {
            let x = i as f64 / 27.0;
            x.sin() + 0.35 * (2.3 * x).cos() + 0.1 * (7.0 * x).sin()
        })
        .collect();
    let gaussian_taps: Vec<f64> = (0..63)
        .map(|i| {
            let x = i as f64 / 8.0;
            (-(x * x) / 8.0).exp()
        })
        .collect();
    let pulse = hat::<f64>(10, 10, 10).to_vec();

    let in1 = signal[..256].to_vec();
    recorder.record(
        "convolve_full_f64",
        convolve_case(&python_bin, "convolve", ConvolveMode::Full, &in1, &gaussian_taps)?,
    )?;
    recorder.record(
        "convolve_same_hat_f64",
        convolve_case(&python_bin, "convolve", ConvolveMode::Same, &pulse, &pulse)?,
    )?;
    // Lengths of opposite parity: 200 and 31
    let uneven = signal[..200].to_vec();
    recorder.record(
        "convolve_same_uneven_f64",
        convolve_case(&python_bin, "convolve", ConvolveMode::Same, &uneven, &gaussian_taps[..31])?,
    )?;
    recorder.record(
        "fftconvolve_same_f64",
        convolve_case(&python_bin, "fftconvolve", ConvolveMode::Same, &signal, &gaussian_taps)?,
    )?;

    recorder.record("spectral_derivative_1d_gaussian_f64", derivative_1d_case(&python_bin)?)?;
    recorder.record(
        "spectral_derivative_2d_dx_f64",
        derivative_2d_case(&python_bin, Axis(1))?,
    )?;
    recorder.record(
        "spectral_derivative_2d_dy_f64",
        derivative_2d_case(&python_bin, Axis(0))?,
    )?;

    let theta = theta_grid(64, TAU);
    let (x, y) = lissajous(
        theta.as_slice().context("theta grid is contiguous")?,
        LissajousConfig {
            x_amplitude: 3.0,
            y_amplitude: 3.0,
            a: 1.0,
            b: 3.0,
            delta: FRAC_PI_2,
        },
    )?;
    recorder.record("dft_partials_lissajous_f64", partials_case(&python_bin, &x, &y)?)?;
    recorder.record(
        "epicycle_frame_lissajous_f64",
        epicycle_frame_case(&python_bin, &x, &y, 17)?,
    )?;

    let version_probe = python_versions(&python_bin)?;
    let report_pdf = out_dir.join("report.pdf");
    generate_plots_and_pdf(&python_bin, &recorder.plot_payload, &report_pdf)?;

    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version: version_probe.python_version,
        numpy_version: version_probe.numpy_version,
        scipy_version: version_probe
            .scipy_version
            .unwrap_or_else(|| "unknown".to_string()),
        matplotlib_version: version_probe
            .matplotlib_version
            .unwrap_or_else(|| "unknown".to_string()),
        rows: recorder.rows,
    };

    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;
    fs::write(
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(&bundle).context("serializing summary bundle")?,
    )
    .context("writing summary.json")?;

    println!("Contract artifacts generated in: {}", out_dir.display());
    println!("  - {}", out_dir.join("summary.csv").display());
    println!("  - {}", out_dir.join("summary.json").display());
    println!("  - {}", report_pdf.display());
    println!("  - {}", plots_dir.display());
    println!("  - cases: {}", bundle.rows.len());

    Ok(())
}

fn convolve_case(
    python_bin: &Path,
    op: &str,
    mode: ConvolveMode,
    in1: &[f64],
    in2: &[f64],
) -> Result<CaseRun> {
    let kernel = ConvolveKernel::try_new(ConvolveConfig { mode })?;
    let direct_mode = DirectMode::from(mode);
    let run_direct = || -> Result<Vec<f64>> {
        Ok(direct_convolve(ArrayView1::from(in1), ArrayView1::from(in2), direct_mode)?.to_vec())
    };

    let candidate = kernel
        .run_alloc(in1, in2)
        .map_err(|e| anyhow!("convolve candidate execution failed: {e}"))?;
    let baseline = run_direct()?;
    let reference = reference_eval(
        python_bin,
        op,
        json!({ "in1": in1, "in2": in2, "mode": mode.to_string() }),
        200,
    )?;

    let candidate_ns = benchmark_avg_ns(120, || {
        kernel
            .run_alloc(in1, in2)
            .map(|_| ())
            .map_err(|e| anyhow!("convolve candidate benchmark failed: {e}"))
    })?;
    let baseline_ns = benchmark_avg_ns(120, || run_direct().map(|_| ()))?;

    Ok(CaseRun {
        candidate,
        baseline,
        reference,
        candidate_ns,
        baseline_ns,
    })
}

/// Second-order periodic central difference, the timing baseline for the spectral kernels.
fn central_difference(f: ArrayView1<'_, f64>, spacing: f64) -> Vec<f64> {
    let n = f.len();
    (0..n)
        .map(|i| (f[(i + 1) % n] - f[(i + n - 1) % n]) / (2.0 * spacing))
        .collect()
}

fn derivative_1d_case(python_bin: &Path) -> Result<CaseRun> {
    const GUARD: usize = 100;
    const LENGTH: f64 = 10.0;
    let n = 1000 + 2 * GUARD;
    let f = periodic_grid(n, LENGTH).mapv(|x| (-x * x).exp());
    let spacing = LENGTH / n as f64;

    let kernel = SpectralDerivativeKernel::try_new(SpectralDerivativeConfig { length: LENGTH })?;
    let candidate = kernel
        .run_alloc(&f)
        .map_err(|e| anyhow!("derivative candidate execution failed: {e}"))?;
    let baseline = central_difference(f.view(), spacing);
    let reference = reference_eval(
        python_bin,
        "spectral_derivative_1d",
        json!({ "f": f.to_vec(), "length": LENGTH }),
        200,
    )?;

    let candidate_ns = benchmark_avg_ns(120, || {
        kernel
            .run_alloc(&f)
            .map(|_| ())
            .map_err(|e| anyhow!("derivative candidate benchmark failed: {e}"))
    })?;
    let baseline_ns = benchmark_avg_ns(120, || {
        let _ = central_difference(f.view(), spacing);
        Ok(())
    })?;

    Ok(CaseRun {
        candidate,
        baseline,
        reference,
        candidate_ns,
        baseline_ns,
    })
}

/// `exp(-(x² + y²) / 0.2)` sampled on a `rows × cols` periodic grid centered on the origin.
fn gaussian_bump(rows: usize, cols: usize, lx: f64, ly: f64) -> Array2<f64> {
    let x = periodic_grid(cols, lx);
    let y = periodic_grid(rows, ly);
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        (-(x[j] * x[j] + y[i] * y[i]) / 0.2).exp()
    })
}

/// Non-square Gaussian bump, differentiated along `axis` (`Axis(1)` is `x`).
fn derivative_2d_case(python_bin: &Path, axis: Axis) -> Result<CaseRun> {
    let (rows, cols) = (48, 64);
    let (lx, ly) = (2.0f64, 1.5f64);
    let f = gaussian_bump(rows, cols, lx, ly);
    let spacing = if axis == Axis(1) {
        lx / cols as f64
    } else {
        ly / rows as f64
    };
    let baseline_field = |f: &Array2<f64>| -> Vec<f64> {
        let mut out = Array2::<f64>::zeros(f.raw_dim());
        for (lane_in, mut lane_out) in f.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
            lane_out.assign(&ArrayView1::from(&central_difference(lane_in, spacing)));
        }
        out.iter().copied().collect()
    };

    let kernel = SpectralGradientKernel::try_new(SpectralGradientConfig { lx, ly })?;
    let pick = |(dfdx, dfdy): (Array2<f64>, Array2<f64>)| -> Vec<f64> {
        let field = if axis == Axis(1) { dfdx } else { dfdy };
        field.iter().copied().collect()
    };
    let candidate = pick(
        kernel
            .run_alloc(&f)
            .map_err(|e| anyhow!("gradient candidate execution failed: {e}"))?,
    );
    let baseline = baseline_field(&f);
    let reference = reference_eval(
        python_bin,
        "spectral_derivative_2d",
        json!({
            "f": f.iter().copied().collect::<Vec<_>>(),
            "rows": rows,
            "cols": cols,
            "lx": lx,
            "ly": ly,
            "axis": if axis == Axis(1) { "x" } else { "y" },
        }),
        50,
    )?;

    let candidate_ns = benchmark_avg_ns(50, || {
        kernel
            .run_alloc(&f)
            .map(|_| ())
            .map_err(|e| anyhow!("gradient candidate benchmark failed: {e}"))
    })?;
    let baseline_ns = benchmark_avg_ns(50, || {
        let _ = baseline_field(&f);
        Ok(())
    })?;

    Ok(CaseRun {
        candidate,
        baseline,
        reference,
        candidate_ns,
        baseline_ns,
    })
}

/// Real parts then imaginary parts, row-major.
fn flatten_complex(s: &Array2<fourier::num_rs::Complex<f64>>) -> Vec<f64> {
    s.iter().map(|c| c.re).chain(s.iter().map(|c| c.im)).collect()
}

/// Partial-sum table from a direct `O(n²)` DFT.
fn direct_partials(x: &[f64], y: &[f64]) -> Array2<fourier::num_rs::Complex<f64>> {
    use fourier::num_rs::Complex;
    let n = x.len();
    let a: Vec<Complex<f64>> = x.iter().zip(y).map(|(&re, &im)| Complex::new(re, im)).collect();
    let spectrum: Vec<Complex<f64>> = (0..n)
        .map(|k| {
            a.iter().enumerate().fold(Complex::new(0.0, 0.0), |acc, (m, v)| {
                acc + v * Complex::from_polar(1.0, -TAU * ((m * k) % n) as f64 / n as f64)
            })
        })
        .collect();
    Array2::from_shape_fn((n, n), |(k, m)| {
        spectrum[k] * Complex::from_polar(1.0 / n as f64, TAU * ((m * k) % n) as f64 / n as f64)
    })
}

fn partials_case(python_bin: &Path, x: &[f64], y: &[f64]) -> Result<CaseRun> {
    let candidate = flatten_complex(&dft_partials(x, y)?);
    let baseline = flatten_complex(&direct_partials(x, y));
    let reference = reference_eval(python_bin, "dft_partials", json!({ "x": x, "y": y }), 20)?;

    let candidate_ns = benchmark_avg_ns(20, || Ok(dft_partials(x, y).map(|_| ())?))?;
    let baseline_ns = benchmark_avg_ns(20, || {
        let _ = direct_partials(x, y);
        Ok(())
    })?;

    Ok(CaseRun {
        candidate,
        baseline,
        reference,
        candidate_ns,
        baseline_ns,
    })
}

fn epicycle_frame_case(python_bin: &Path, x: &[f64], y: &[f64], m: usize) -> Result<CaseRun> {
    let flatten = |e: &Epicycles<f64>| -> Result<Vec<f64>> {
        let frame = e
            .frame(m)
            .with_context(|| format!("frame {m} out of range"))?;
        Ok([frame.u, frame.v, frame.x, frame.y].concat())
    };
    let epicycles = Epicycles::new(x, y)?;
    let candidate = flatten(&epicycles)?;
    // Same frame assembled from the direct-DFT table
    let s = direct_partials(x, y);
    let column = s.column(m);
    let u: Vec<f64> = column.iter().map(|c| c.re).collect();
    let v: Vec<f64> = column.iter().map(|c| c.im).collect();
    let tails = |d: &[f64]| -> Vec<f64> {
        let mut acc = 0.0;
        d.iter()
            .map(|step| {
                let tail = acc;
                acc += step;
                tail
            })
            .collect()
    };
    let baseline = [u.clone(), v.clone(), tails(&u), tails(&v)].concat();
    let reference = reference_eval(
        python_bin,
        "epicycle_frame",
        json!({ "x": x, "y": y, "m": m }),
        20,
    )?;

    let candidate_ns = benchmark_avg_ns(20, || {
        let e = Epicycles::new(x, y)?;
        flatten(&e).map(|_| ())
    })?;
    let baseline_ns = benchmark_avg_ns(20, || {
        let _ = direct_partials(x, y);
        Ok(())
    })?;

    Ok(CaseRun {
        candidate,
        baseline,
        reference,
        candidate_ns,
        baseline_ns,
    })
}

fn ensure_same_length(case_id: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        bail!(
            "case {case_id} has mismatched output lengths: left={}, right={}",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

/// Agreement between a candidate and its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Metrics {
    pearson_r: f64,
    mae: f64,
    rmse: f64,
    max_abs: f64,
}

impl Metrics {
    fn between(a: &[f64], b: &[f64]) -> Self {
        let n = a.len().max(1) as f64;
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| x - y);
        let (abs_sum, sq_sum, max_abs) = diffs.fold((0.0, 0.0, 0.0f64), |(s, q, m), d| {
            (s + d.abs(), q + d * d, m.max(d.abs()))
        });
        Self {
            pearson_r: pearson(a, b),
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            max_abs,
        }
    }
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (cov, var_a, var_b) = a
        .iter()
        .zip(b.iter())
        .fold((0.0, 0.0, 0.0), |(c, va, vb), (x, y)| {
            let (da, db) = (x - mean_a, y - mean_b);
            (c + da * db, va + da * da, vb + db * db)
        });
    if var_a == 0.0 || var_b == 0.0 {
        if a == b {
            1.0
        } else {
            0.0
        }
    } else {
        cov / (var_a.sqrt() * var_b.sqrt())
    }
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,pearson_r,mae,rmse,max_abs,rust_candidate_ns,rust_baseline_ns,python_ns,speedup_vs_baseline,speedup_vs_python,overlay_plot,residual_plot\n");
    for row in rows {
        out.push_str(&format!(
            "{},{:.12},{:.12},{:.12},{:.12},{:.3},{:.3},{:.3},{:.6},{:.6},{},{}\n",
            row.case_id,
            row.pearson_r,
            row.mae,
            row.rmse,
            row.max_abs,
            row.rust_candidate_ns,
            row.rust_baseline_ns,
            row.python_ns,
            row.speedup_vs_baseline,
            row.speedup_vs_python,
            row.overlay_plot,
            row.residual_plot
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

const PY_REPORT_SCRIPT: &str = r#"
import json
import sys
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt
from matplotlib.backends.backend_pdf import PdfPages

payload = json.loads(sys.stdin.read())

def page(pdf, path, title, ylabel, series):
    fig = plt.figure(figsize=(10, 4))
    ax = fig.add_subplot(1, 1, 1)
    for label, values, kwargs in series:
        ax.plot(range(len(values)), values, label=label, **kwargs)
    ax.set_title(title)
    ax.set_xlabel("index")
    ax.set_ylabel(ylabel)
    ax.legend()
    fig.tight_layout()
    fig.savefig(path, dpi=150)
    pdf.savefig(fig)
    plt.close(fig)

with PdfPages(payload["report_pdf"]) as pdf:
    for case in payload["cases"]:
        rust = case["rust_candidate"]
        py = case["python_reference"]
        page(pdf, case["overlay_plot"], f"{case['case_id']} :: overlay", "value", [
            ("numpy reference", py, {"linewidth": 1.6}),
            ("Rust candidate", rust, {"linewidth": 1.2, "alpha": 0.8}),
        ])
        page(pdf, case["residual_plot"], f"{case['case_id']} :: residual", "error", [
            ("Rust - numpy", [r - p for r, p in zip(rust, py)], {"linewidth": 1.2, "color": "tab:red"}),
        ])
"#;

fn generate_plots_and_pdf(
    python_bin: &Path,
    case_payload: &[serde_json::Value],
    report_pdf: &Path,
) -> Result<()> {
    let payload = json!({
        "cases": case_payload,
        "report_pdf": report_pdf.to_string_lossy()
    });
    run_python(python_bin, PY_REPORT_SCRIPT, &payload).context("plot/pdf generation failed")?;
    Ok(())
}
