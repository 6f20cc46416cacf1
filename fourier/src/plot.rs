use crate::signal::epicycles::Epicycles;
use ndarray::ArrayView2;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Environment variable naming the Python interpreter used for plotting.
pub const PYTHON_ENV: &str = "FOURIER_PYTHON";

const DEFAULT_PYTHON_BIN: &str = "python";

/// Errors raised by plot utilities.
#[derive(Debug)]
pub enum PlotError {
    /// Underlying process or filesystem I/O failure.
    Io(std::io::Error),
    /// Python subprocess stdin was unavailable.
    StdinUnavailable,
    /// Python subprocess exited unsuccessfully.
    PythonExitFailure(ExitStatus),
    /// Nothing to draw.
    Empty,
}

impl core::fmt::Display for PlotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlotError::Io(err) => write!(f, "plot I/O failure: {err}"),
            PlotError::StdinUnavailable => {
                write!(f, "failed to open stdin for python plotting process")
            }
            PlotError::PythonExitFailure(status) => {
                write!(f, "python plotting script failed with status: {status}")
            }
            PlotError::Empty => write!(f, "nothing to plot"),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io(err) => Some(err),
            PlotError::StdinUnavailable | PlotError::PythonExitFailure(_) | PlotError::Empty => {
                None
            }
        }
    }
}

impl From<std::io::Error> for PlotError {
    fn from(value: std::io::Error) -> Self {
        PlotError::Io(value)
    }
}

/// One subplot of a figure.
#[derive(Debug, Clone)]
pub enum Panel<'a> {
    /// Labelled series sharing one abscissa.
    Lines {
        /// Axes title.
        title: &'a str,
        /// Shared abscissa.
        x: &'a [f64],
        /// `(label, ordinate)` pairs, each as long as `x`.
        series: Vec<(&'a str, &'a [f64])>,
    },
    /// A parametric planar curve drawn with equal axis scaling.
    Curve {
        /// Axes title.
        title: &'a str,
        /// Horizontal coordinates.
        x: &'a [f64],
        /// Vertical coordinates.
        y: &'a [f64],
    },
    /// A scalar field; rows run along `y` from the bottom of the image.
    Image {
        /// Axes title.
        title: &'a str,
        /// Field samples, `(rows, cols) = (Ny, Nx)`.
        field: ArrayView2<'a, f64>,
        /// `[x_min, x_max, y_min, y_max]`.
        extent: [f64; 4],
    },
}

/// Interpreter to run: `value` when set and non-blank, `python` otherwise.
pub fn interpreter_from(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PYTHON_BIN.to_string())
}

/// Interpreter selected by the `FOURIER_PYTHON` environment variable.
pub fn python_interpreter() -> String {
    interpreter_from(std::env::var(PYTHON_ENV).ok())
}

fn py_float(v: f64) -> String {
    if v.is_nan() {
        "float('nan')".to_string()
    } else if v == f64::INFINITY {
        "float('inf')".to_string()
    } else if v == f64::NEG_INFINITY {
        "-float('inf')".to_string()
    } else {
        format!("{v:?}")
    }
}

/// Render values as a Python list literal.
pub fn py_list<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut out = String::from("[");
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&py_float(*v));
    }
    out.push(']');
    out
}

fn py_str(s: &str) -> String {
    format!("{s:?}")
}

fn py_path(path: &Path) -> String {
    py_str(&path.to_string_lossy())
}

const PREAMBLE: &str = r#"
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt
import numpy as np
"#;

/// Python source drawing `panels` side by side and saving the figure to `output`.
pub fn figure_script(panels: &[Panel<'_>], output: &Path) -> String {
    let mut script = String::from(PREAMBLE);
    let _ = writeln!(
        script,
        "fig, axes = plt.subplots(1, {n}, figsize=({w}, 4.5), squeeze=False)",
        n = panels.len().max(1),
        w = 5 * panels.len().max(1),
    );
    for (i, panel) in panels.iter().enumerate() {
        let _ = writeln!(script, "ax = axes[0][{i}]");
        match panel {
            Panel::Lines { title, x, series } => {
                let _ = writeln!(script, "x = {}", py_list(x.iter()));
                for (label, y) in series {
                    let _ = writeln!(
                        script,
                        "ax.plot(x, {}, label={})",
                        py_list(y.iter()),
                        py_str(label)
                    );
                }
                let _ = writeln!(script, "ax.legend()");
                let _ = writeln!(script, "ax.set_title({})", py_str(title));
            }
            Panel::Curve { title, x, y } => {
                let _ = writeln!(
                    script,
                    "ax.plot({}, {}, lw=1.2)",
                    py_list(x.iter()),
                    py_list(y.iter())
                );
                let _ = writeln!(script, "ax.set_aspect('equal')");
                let _ = writeln!(script, "ax.set_title({})", py_str(title));
            }
            Panel::Image {
                title,
                field,
                extent,
            } => {
                let rows = field
                    .rows()
                    .into_iter()
                    .map(|row| py_list(row.iter()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(
                    script,
                    "im = ax.imshow(np.array([{rows}]), extent={}, origin='lower', aspect='auto')",
                    py_list(extent.iter())
                );
                let _ = writeln!(script, "fig.colorbar(im, ax=ax)");
                let _ = writeln!(script, "ax.set_title({})", py_str(title));
            }
        }
    }
    let _ = writeln!(script, "fig.tight_layout()");
    let _ = writeln!(script, "fig.savefig({}, dpi=150)", py_path(output));
    let _ = writeln!(script, "plt.close(fig)");
    script
}

/// Python source animating `epicycles` as a quiver of arrows plus the traced curve.
///
/// Every `step`-th frame is drawn (`step` of zero is treated as one), `interval_ms`
/// apart, and the animation is written as a GIF to `output`.
pub fn epicycle_script(
    epicycles: &Epicycles<f64>,
    step: usize,
    interval_ms: u32,
    output: &Path,
) -> String {
    let step = step.max(1);
    let mut script = String::from(PREAMBLE);
    script.push_str("from matplotlib import animation\n");
    let (x, y) = epicycles.trace(epicycles.len());
    let _ = writeln!(script, "x = {}", py_list(x.iter()));
    let _ = writeln!(script, "y = {}", py_list(y.iter()));
    script.push_str("frames = [\n");
    for (m, frame) in epicycles.frames().enumerate().step_by(step) {
        let _ = writeln!(
            script,
            "    ({m}, {}, {}, {}, {}),",
            py_list(frame.u.iter()),
            py_list(frame.v.iter()),
            py_list(frame.x.iter()),
            py_list(frame.y.iter()),
        );
    }
    script.push_str("]\n");
    let _ = writeln!(script, "lim = {}", py_float(epicycles.extent()));
    script.push_str(
        r#"fig, ax = plt.subplots(1, 1, figsize=(6, 6))
ax.set_xlim(-lim, lim)
ax.set_ylim(-lim, lim)
line, = ax.plot([], [], lw=2)
_, u0, v0, x0, y0 = frames[0]
quiver = ax.quiver(x0, y0, u0, v0, angles='xy', units='xy', scale_units='xy', scale=1)

def draw(frame):
    m, u, v, fx, fy = frame
    quiver.set_UVC(u, v)
    quiver.set_offsets(np.transpose(np.vstack((fx, fy))))
    line.set_data(x[:m], y[:m])
    return quiver, line

fig.tight_layout()
"#,
    );
    let _ = writeln!(
        script,
        "anim = animation.FuncAnimation(fig, draw, frames=frames, interval={interval_ms}, blit=True)"
    );
    let fps = (1000 / interval_ms.max(1)).max(1);
    let _ = writeln!(
        script,
        "anim.save({}, writer=animation.PillowWriter(fps={fps}))",
        py_path(output)
    );
    let _ = writeln!(script, "plt.close(fig)");
    script
}

fn prepare_output(output: &Path) -> Result<(), PlotError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn run_python(script: &str) -> Result<(), PlotError> {
    let interpreter = python_interpreter();
    tracing::debug!(%interpreter, bytes = script.len(), "running plot script");
    let mut python = std::process::Command::new(&interpreter)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::null()) // noisy
        .stderr(std::process::Stdio::null()) // noisy
        .spawn()?;

    if let Some(mut stdin) = python.stdin.take() {
        stdin.write_all(script.as_bytes())?;
    } else {
        return Err(PlotError::StdinUnavailable);
    }

    let status = python.wait()?;
    if !status.success() {
        return Err(PlotError::PythonExitFailure(status));
    }
    Ok(())
}

/// Render `panels` into a PNG at `output`.
///
/// Returns the output path when plotting succeeds.
pub fn python_plot<P: AsRef<Path>>(panels: &[Panel<'_>], output: P) -> Result<PathBuf, PlotError> {
    if panels.is_empty() {
        return Err(PlotError::Empty);
    }
    let output = output.as_ref().to_path_buf();
    prepare_output(&output)?;
    run_python(&figure_script(panels, &output))?;
    Ok(output)
}

/// Render the epicycle animation of a curve into a GIF at `output`.
///
/// Returns the output path when the animation was written.
pub fn python_animate_epicycles<P: AsRef<Path>>(
    epicycles: &Epicycles<f64>,
    step: usize,
    interval_ms: u32,
    output: P,
) -> Result<PathBuf, PlotError> {
    if epicycles.is_empty() {
        return Err(PlotError::Empty);
    }
    let output = output.as_ref().to_path_buf();
    prepare_output(&output)?;
    run_python(&epicycle_script(epicycles, step, interval_ms, &output))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn interpreter_falls_back_to_python() {
        assert_eq!(interpreter_from(None), "python");
        assert_eq!(interpreter_from(Some("  ".into())), "python");
        assert_eq!(interpreter_from(Some("python3.12".into())), "python3.12");
    }

    #[test]
    fn py_list_spells_non_finite_values() {
        assert_eq!(py_list(&[1.0, -0.5]), "[1.0, -0.5]");
        assert_eq!(py_list(&[1e-9]), "[1e-9]");
        assert_eq!(
            py_list(&[f64::NAN, f64::INFINITY, f64::NEG_INFINITY]),
            "[float('nan'), float('inf'), -float('inf')]"
        );
        assert_eq!(py_list(&[] as &[f64]), "[]");
    }

    #[test]
    fn figure_script_draws_every_panel() {
        let x = [0.0, 1.0, 2.0];
        let y = [1.0, 0.0, 1.0];
        let field = array![[0.0, 1.0], [2.0, 3.0]];
        let panels = [
            Panel::Lines {
                title: "signal",
                x: &x,
                series: vec![("f", &y[..]), ("df", &x[..])],
            },
            Panel::Curve {
                title: "curve",
                x: &x,
                y: &y,
            },
            Panel::Image {
                title: "field",
                field: field.view(),
                extent: [-1.0, 1.0, -1.0, 1.0],
            },
        ];
        let script = figure_script(&panels, Path::new("out/fig.png"));
        assert!(script.contains("plt.subplots(1, 3"));
        assert!(script.contains("label=\"df\""));
        assert!(script.contains("np.array([[0.0, 1.0], [2.0, 3.0]])"));
        assert!(script.contains("extent=[-1.0, 1.0, -1.0, 1.0]"));
        assert!(script.contains("fig.savefig(\"out/fig.png\""));
    }

    #[test]
    fn epicycle_script_strides_frames() {
        let x = [1.0, -1.0, -1.0, 1.0, 0.5];
        let y = [1.0, 1.0, -1.0, -1.0, 0.0];
        let epicycles = Epicycles::new(&x, &y).expect("epicycles");
        let script = epicycle_script(&epicycles, 2, 50, Path::new("spin.gif"));
        let frames = script.lines().filter(|l| l.starts_with("    (")).count();
        assert_eq!(frames, 3);
        assert!(script.contains("    (4, "));
        assert!(script.contains("interval=50"));
        assert!(script.contains("PillowWriter(fps=20)"));

        let every = epicycle_script(&epicycles, 0, 50, Path::new("spin.gif"));
        assert_eq!(every.lines().filter(|l| l.starts_with("    (")).count(), 5);
    }

    #[test]
    fn empty_figure_is_rejected_before_spawning() {
        let err = python_plot(&[], "unused.png").expect_err("no panels");
        assert!(matches!(err, PlotError::Empty));
    }
}
