//! The five demo applications, each configurable through a JSON parameter file.

use anyhow::{bail, Context, Result};
use fourier::num_rs::{convolve as direct_convolve, ConvolveMode as DirectMode};
use fourier::plot::{python_animate_epicycles, python_plot, Panel};
use fourier::signal::convolve::{fft_convolve, ConvolveMode};
use fourier::signal::derivative::{
    periodic_grid, spectral_derivative_1d, spectral_derivative_2d, trim_guard,
};
use fourier::signal::epicycles::Epicycles;
use fourier::signal::wave::{
    harmonograph, hat, lissajous, theta_grid, HarmonographConfig, LissajousConfig,
};
use ndarray::{Array2, ArrayView1};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const OUT_DIR: &str = "target/demos";

/// Demo application selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Harmonograph,
    Lissajous,
    Convolution,
    Derivative1d,
    Derivative2d,
}

impl Demo {
    const ALL: [Demo; 5] = [
        Demo::Harmonograph,
        Demo::Lissajous,
        Demo::Convolution,
        Demo::Derivative1d,
        Demo::Derivative2d,
    ];

    fn name(self) -> &'static str {
        match self {
            Demo::Harmonograph => "harmonograph",
            Demo::Lissajous => "lissajous",
            Demo::Convolution => "convolution",
            Demo::Derivative1d => "derivative-1d",
            Demo::Derivative2d => "derivative-2d",
        }
    }
}

impl FromStr for Demo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Demo::ALL.into_iter().find(|d| d.name() == s) {
            Some(demo) => Ok(demo),
            None => {
                let names: Vec<_> = Demo::ALL.iter().map(|d| d.name()).collect();
                bail!("unknown demo `{s}`, expected one of: {}", names.join(", "))
            }
        }
    }
}

/// Animation timing shared by the curve demos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationParams {
    /// Wall-clock length of the full animation.
    pub duration_secs: f64,
    /// Draw every `frame_step`-th sample.
    pub frame_step: usize,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            frame_step: 4,
        }
    }
}

impl AnimationParams {
    /// Delay between drawn frames so that `n` samples span `duration_secs`.
    fn interval_ms(&self, n: usize) -> u32 {
        let per_sample = self.duration_secs * 1000.0 / n.max(1) as f64;
        (per_sample * self.frame_step.max(1) as f64).round().max(1.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonographParams {
    pub n: usize,
    /// Last parameter value; the grid runs from `1/n`.
    pub t_end: f64,
    pub amplitudes: [f64; 4],
    pub frequencies: [f64; 4],
    pub phases: [f64; 4],
    pub decays: [f64; 4],
    pub animation: AnimationParams,
}

impl Default for HarmonographParams {
    fn default() -> Self {
        Self {
            n: 1000,
            t_end: 14.0 * PI,
            amplitudes: [2.0, 6.0, 1.2, 3.0],
            frequencies: [2.0, 6.0, 1.0, 2.0],
            phases: [PI / 16.0, FRAC_PI_2, PI / 16.0, PI],
            decays: [0.02, 0.0315, 0.02, 0.02],
            animation: AnimationParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LissajousParams {
    pub n: usize,
    pub x_amplitude: f64,
    pub y_amplitude: f64,
    pub a: f64,
    pub b: f64,
    pub delta: f64,
    pub animation: AnimationParams,
}

impl Default for LissajousParams {
    fn default() -> Self {
        Self {
            n: 500,
            x_amplitude: 3.0,
            y_amplitude: 3.0,
            a: 1.0,
            b: 3.0,
            delta: FRAC_PI_2,
            animation: AnimationParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvolutionParams {
    /// `(n1, n2, n3)` of the first hat pulse.
    pub signal_1: [usize; 3],
    /// `(n1, n2, n3)` of the second hat pulse.
    pub signal_2: [usize; 3],
    pub mode: String,
}

impl Default for ConvolutionParams {
    fn default() -> Self {
        Self {
            signal_1: [10, 10, 10],
            signal_2: [10, 10, 10],
            mode: "same".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Derivative1dParams {
    /// Samples kept after the guard is trimmed.
    pub n: usize,
    /// Samples added on each side to absorb edge artifacts.
    pub guard: usize,
    pub length: f64,
}

impl Default for Derivative1dParams {
    fn default() -> Self {
        Self {
            n: 10_000,
            guard: 1000,
            length: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Derivative2dParams {
    pub nx: usize,
    pub ny: usize,
    pub lx: f64,
    pub ly: f64,
    /// Width parameter `s` of `exp(-(x² + y²) / s)`.
    pub spread: f64,
}

impl Default for Derivative2dParams {
    fn default() -> Self {
        Self {
            nx: 200,
            ny: 200,
            lx: 2.0,
            ly: 2.0,
            spread: 0.2,
        }
    }
}

fn load_params<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default + Serialize + std::fmt::Debug,
{
    let params = match path {
        None => T::default(),
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading demo config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing demo config {}", path.display()))?
        }
    };
    tracing::debug!(?params, "demo parameters");
    Ok(params)
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(
        path,
        serde_json::to_vec_pretty(value).context("serializing demo output")?,
    )
    .with_context(|| format!("writing {}", path.display()))
}

/// Plotting needs a working matplotlib; a failure is reported but does not fail the demo.
fn report_plot(result: Result<PathBuf, fourier::plot::PlotError>) {
    match result {
        Ok(path) => tracing::info!(path = %path.display(), "wrote figure"),
        Err(err) => tracing::warn!(%err, "plotting skipped"),
    }
}

pub fn run_demo(demo: Demo, config: Option<&Path>) -> Result<()> {
    let out_dir = PathBuf::from(OUT_DIR).join(demo.name());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating demo output directory {}", out_dir.display()))?;
    tracing::info!(demo = demo.name(), out = %out_dir.display(), "running demo");

    match demo {
        Demo::Harmonograph => run_harmonograph(&load_params(config)?, &out_dir),
        Demo::Lissajous => run_lissajous(&load_params(config)?, &out_dir),
        Demo::Convolution => run_convolution(&load_params(config)?, &out_dir),
        Demo::Derivative1d => run_derivative_1d(&load_params(config)?, &out_dir),
        Demo::Derivative2d => run_derivative_2d(&load_params(config)?, &out_dir),
    }
}

fn harmonograph_curve(params: &HarmonographParams) -> Result<(Vec<f64>, Vec<f64>)> {
    let theta = theta_grid(params.n, params.t_end);
    let theta = theta.as_slice().context("theta grid is contiguous")?;
    Ok(harmonograph(
        theta,
        HarmonographConfig {
            amplitudes: params.amplitudes,
            frequencies: params.frequencies,
            phases: params.phases,
            decays: params.decays,
        },
    )?)
}

fn lissajous_curve(params: &LissajousParams) -> Result<(Vec<f64>, Vec<f64>)> {
    let theta = theta_grid(params.n, TAU);
    let theta = theta.as_slice().context("theta grid is contiguous")?;
    Ok(lissajous(
        theta,
        LissajousConfig {
            x_amplitude: params.x_amplitude,
            y_amplitude: params.y_amplitude,
            a: params.a,
            b: params.b,
            delta: params.delta,
        },
    )?)
}

fn animate_curve(
    name: &str,
    x: &[f64],
    y: &[f64],
    animation: &AnimationParams,
    out_dir: &Path,
) -> Result<()> {
    let epicycles = Epicycles::new(x, y)?;
    tracing::info!(
        samples = epicycles.len(),
        extent = epicycles.extent(),
        "epicycle decomposition"
    );
    write_json(
        &out_dir.join(format!("{name}.json")),
        &json!({ "x": x, "y": y, "extent": epicycles.extent() }),
    )?;
    report_plot(python_plot(
        &[Panel::Curve {
            title: name,
            x,
            y,
        }],
        out_dir.join(format!("{name}.png")),
    ));
    report_plot(python_animate_epicycles(
        &epicycles,
        animation.frame_step,
        animation.interval_ms(epicycles.len()),
        out_dir.join(format!("{name}.gif")),
    ));
    Ok(())
}

fn run_harmonograph(params: &HarmonographParams, out_dir: &Path) -> Result<()> {
    let (x, y) = harmonograph_curve(params)?;
    animate_curve("harmonograph", &x, &y, &params.animation, out_dir)
}

fn run_lissajous(params: &LissajousParams, out_dir: &Path) -> Result<()> {
    let (x, y) = lissajous_curve(params)?;
    animate_curve("lissajous", &x, &y, &params.animation, out_dir)
}

struct ConvolutionOutput {
    s1: Vec<f64>,
    s2: Vec<f64>,
    fft: Vec<f64>,
    direct: Vec<f64>,
}

fn convolution_outputs(params: &ConvolutionParams) -> Result<ConvolutionOutput> {
    let [a1, b1, c1] = params.signal_1;
    let [a2, b2, c2] = params.signal_2;
    let s1 = hat::<f64>(a1, b1, c1).to_vec();
    let s2 = hat::<f64>(a2, b2, c2).to_vec();
    let fft = fft_convolve(&s1, &s2, &params.mode)?;
    let mode: ConvolveMode = params.mode.parse()?;
    let direct = direct_convolve(
        ArrayView1::from(&s1),
        ArrayView1::from(&s2),
        DirectMode::from(mode),
    )?
    .to_vec();
    Ok(ConvolutionOutput {
        s1,
        s2,
        fft,
        direct,
    })
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn index_axis(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

fn run_convolution(params: &ConvolutionParams, out_dir: &Path) -> Result<()> {
    let out = convolution_outputs(params)?;
    tracing::info!(
        mode = %params.mode,
        len = out.fft.len(),
        fft_minus_direct = max_abs_diff(&out.fft, &out.direct),
        "convolution"
    );
    write_json(
        &out_dir.join("convolution.json"),
        &json!({
            "signal_1": out.s1,
            "signal_2": out.s2,
            "fft_convolve": out.fft,
            "direct": out.direct,
        }),
    )?;

    let (x1, x2, x3) = (
        index_axis(out.s1.len()),
        index_axis(out.s2.len()),
        index_axis(out.fft.len()),
    );
    report_plot(python_plot(
        &[
            Panel::Lines {
                title: "Signal 1",
                x: &x1,
                series: vec![("s1", &out.s1[..])],
            },
            Panel::Lines {
                title: "Signal 2",
                x: &x2,
                series: vec![("s2", &out.s2[..])],
            },
            Panel::Lines {
                title: "Convolution",
                x: &x3,
                series: vec![("fft_convolve", &out.fft[..]), ("direct", &out.direct[..])],
            },
        ],
        out_dir.join("convolution.png"),
    ));
    Ok(())
}

struct Derivative1dOutput {
    x: Vec<f64>,
    f: Vec<f64>,
    df: Vec<f64>,
    exact: Vec<f64>,
}

fn derivative_1d_outputs(params: &Derivative1dParams) -> Result<Derivative1dOutput> {
    let total = params.n + 2 * params.guard;
    let x = periodic_grid(total, params.length);
    let f = x.mapv(|v| (-v * v).exp());
    let f = f.as_slice().context("sampled function is contiguous")?;
    let df = spectral_derivative_1d(f, params.length)?;

    let x = x.as_slice().context("grid is contiguous")?;
    let x = trim_guard(x, params.guard).to_vec();
    let f = trim_guard(f, params.guard).to_vec();
    let df = trim_guard(&df, params.guard).to_vec();
    let exact = x.iter().map(|v| -2.0 * v * (-v * v).exp()).collect();
    Ok(Derivative1dOutput { x, f, df, exact })
}

fn run_derivative_1d(params: &Derivative1dParams, out_dir: &Path) -> Result<()> {
    let out = derivative_1d_outputs(params)?;
    tracing::info!(
        samples = out.x.len(),
        guard = params.guard,
        max_abs_error = max_abs_diff(&out.df, &out.exact),
        "spectral derivative of exp(-x^2)"
    );
    write_json(
        &out_dir.join("derivative-1d.json"),
        &json!({ "x": out.x, "f": out.f, "dfdx": out.df }),
    )?;
    report_plot(python_plot(
        &[
            Panel::Lines {
                title: "f(x)",
                x: &out.x,
                series: vec![("exp(-x^2)", &out.f[..])],
            },
            Panel::Lines {
                title: "df/dx",
                x: &out.x,
                series: vec![("spectral", &out.df[..]), ("exact", &out.exact[..])],
            },
        ],
        out_dir.join("derivative-1d.png"),
    ));
    Ok(())
}

struct Derivative2dOutput {
    f: Array2<f64>,
    dfdx: Array2<f64>,
    dfdy: Array2<f64>,
    max_abs_error: f64,
}

fn derivative_2d_outputs(params: &Derivative2dParams) -> Result<Derivative2dOutput> {
    let x = periodic_grid(params.nx, params.lx);
    let y = periodic_grid(params.ny, params.ly);
    let s = params.spread;
    let bump = |x: f64, y: f64| (-(x * x + y * y) / s).exp();
    let f = Array2::from_shape_fn((params.ny, params.nx), |(i, j)| bump(x[j], y[i]));
    let (dfdx, dfdy) = spectral_derivative_2d(f.view(), params.lx, params.ly)?;

    // The bump is not smooth across the periodic seam; score the central half only
    let max_abs_error = ndarray::Zip::indexed(&dfdx)
        .and(&dfdy)
        .fold(0.0f64, |acc, (i, j), &dx, &dy| {
            let (xv, yv) = (x[j], y[i]);
            if xv.abs() > params.lx / 4.0 || yv.abs() > params.ly / 4.0 {
                return acc;
            }
            let ex = -2.0 * xv / s * bump(xv, yv);
            let ey = -2.0 * yv / s * bump(xv, yv);
            acc.max((dx - ex).abs()).max((dy - ey).abs())
        });
    Ok(Derivative2dOutput {
        f,
        dfdx,
        dfdy,
        max_abs_error,
    })
}

fn run_derivative_2d(params: &Derivative2dParams, out_dir: &Path) -> Result<()> {
    let out = derivative_2d_outputs(params)?;
    tracing::info!(
        shape = ?out.f.dim(),
        max_abs_error = out.max_abs_error,
        "spectral gradient of exp(-(x^2 + y^2) / s), central half"
    );
    let rows = |a: &Array2<f64>| -> Vec<Vec<f64>> {
        a.rows().into_iter().map(|r| r.to_vec()).collect()
    };
    write_json(
        &out_dir.join("derivative-2d.json"),
        &json!({ "f": rows(&out.f), "dfdx": rows(&out.dfdx), "dfdy": rows(&out.dfdy) }),
    )?;

    let extent = [
        -params.lx / 2.0,
        params.lx / 2.0,
        -params.ly / 2.0,
        params.ly / 2.0,
    ];
    report_plot(python_plot(
        &[
            Panel::Image {
                title: "f",
                field: out.f.view(),
                extent,
            },
            Panel::Image {
                title: "df/dx",
                field: out.dfdx.view(),
                extent,
            },
            Panel::Image {
                title: "df/dy",
                field: out.dfdy.view(),
                extent,
            },
        ],
        out_dir.join("derivative-2d.png"),
    ));
    Ok(())
}
