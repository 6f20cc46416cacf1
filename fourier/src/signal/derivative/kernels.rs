//! Trait-first kernels for spectral differentiation.

use crate::kernel::{
    ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Read2D, Write1D, Write2D,
};
use crate::signal::traits::{Derivative1D, Gradient2D};
use crate::signal::{count, lit};
use fourier_core::num_rs::{fft, fft2, fftfreq, ifft, ifft2};
use ndarray::{Array1, Array2, ArrayView2};
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

fn check_width<F: Float>(width: F, arg: &'static str) -> Result<(), ConfigError> {
    if !width.is_finite() || width <= F::zero() {
        return Err(ConfigError::InvalidArgument {
            arg,
            reason: "domain width must be finite and > 0",
        });
    }
    Ok(())
}

/// Angular wavenumbers `2π·fftfreq(n, width/n)` for `n` samples across `width`.
pub(crate) fn wavenumbers<F>(n: usize, width: F) -> Result<Array1<F>, ExecInvariantViolation>
where
    F: Float,
{
    let two_pi = lit::<F>(core::f64::consts::TAU);
    let freqs = fftfreq(n, width / count::<F>(n))?;
    Ok(freqs.mapv(|f| two_pi * f))
}

/// `i·k·z` without promoting `k` to a complex number.
fn times_ik<F: Float>(z: Complex<F>, k: F) -> Complex<F> {
    Complex::new(-k * z.im, k * z.re)
}

/// Constructor config for [`SpectralDerivativeKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralDerivativeConfig<F> {
    /// Width `L` of the domain spanned by the samples, so spacing is `L / N`.
    pub length: F,
}

/// Trait-first 1D spectral derivative kernel.
///
/// Samples are assumed uniformly spaced over a periodic domain of width `L`,
/// e.g. `[-L/2, L/2)`. Non-periodic signals differentiate with edge artifacts;
/// pad them with a guard region and trim it afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralDerivativeKernel<F> {
    length: F,
}

impl<F: Copy> SpectralDerivativeKernel<F> {
    /// Return configured domain width.
    pub fn length(&self) -> F {
        self.length
    }
}

impl<F> KernelLifecycle for SpectralDerivativeKernel<F>
where
    F: Float,
{
    type Config = SpectralDerivativeConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_width(config.length, "length")?;
        Ok(Self {
            length: config.length,
        })
    }
}

impl<F> SpectralDerivativeKernel<F>
where
    F: Float + FftNum,
{
    fn differentiate(&self, f: &[F]) -> Result<Vec<F>, ExecInvariantViolation> {
        if f.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "derivative input must be non-empty",
            });
        }
        let n = f.len();
        tracing::debug!(n, "spectral derivative 1d");

        let lifted = f
            .iter()
            .map(|&v| Complex::new(v, F::zero()))
            .collect::<Array1<_>>();
        let mut f_hat = fft(lifted.view(), None)?;
        let omega = wavenumbers(n, self.length)?;
        f_hat
            .iter_mut()
            .zip(omega.iter())
            .for_each(|(z, &w)| *z = times_ik(*z, w));

        let df = ifft(f_hat.view(), None)?;
        Ok(df.iter().map(|c| c.re).collect())
    }
}

impl<F> Derivative1D<F> for SpectralDerivativeKernel<F>
where
    F: Float + FftNum,
{
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        let out = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if out.len() != input.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: input.len(),
                got: out.len(),
            });
        }
        let df = self.differentiate(input)?;
        out.copy_from_slice(&df);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice().map_err(ExecInvariantViolation::from)?;
        self.differentiate(input)
    }
}

/// Constructor config for [`SpectralGradientKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralGradientConfig<F> {
    /// Domain width along `x`, the column axis.
    pub lx: F,
    /// Domain width along `y`, the row axis.
    pub ly: F,
}

/// Trait-first 2D spectral gradient kernel.
///
/// Fields are laid out `(rows, cols) = (Ny, Nx)` with `f[[i, j]] = f(x_j, y_i)`,
/// the layout `meshgrid(x, y)` produces. `df/dx` differentiates along columns
/// and `df/dy` along rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralGradientKernel<F> {
    lx: F,
    ly: F,
}

impl<F: Copy> SpectralGradientKernel<F> {
    /// Return configured `(lx, ly)` domain widths.
    pub fn widths(&self) -> (F, F) {
        (self.lx, self.ly)
    }
}

impl<F> KernelLifecycle for SpectralGradientKernel<F>
where
    F: Float,
{
    type Config = SpectralGradientConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        check_width(config.lx, "lx")?;
        check_width(config.ly, "ly")?;
        Ok(Self {
            lx: config.lx,
            ly: config.ly,
        })
    }
}

impl<F> SpectralGradientKernel<F>
where
    F: Float + FftNum,
{
    fn differentiate(
        &self,
        f: ArrayView2<'_, F>,
    ) -> Result<(Array2<F>, Array2<F>), ExecInvariantViolation> {
        let (ny, nx) = f.dim();
        if nx == 0 || ny == 0 {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "gradient input must be non-empty along both axes",
            });
        }
        tracing::debug!(nx, ny, "spectral derivative 2d");

        let f_hat = fft2(f.mapv(|v| Complex::new(v, F::zero())).view())?;
        let kx = wavenumbers(nx, self.lx)?;
        let ky = wavenumbers(ny, self.ly)?;

        let dx_hat = Array2::from_shape_fn((ny, nx), |(i, j)| times_ik(f_hat[[i, j]], kx[j]));
        let dy_hat = Array2::from_shape_fn((ny, nx), |(i, j)| times_ik(f_hat[[i, j]], ky[i]));

        let dfdx = ifft2(dx_hat.view())?.mapv(|c| c.re);
        let dfdy = ifft2(dy_hat.view())?.mapv(|c| c.re);
        Ok((dfdx, dfdy))
    }
}

impl<F> Gradient2D<F> for SpectralGradientKernel<F>
where
    F: Float + FftNum,
{
    fn run_into<I, OX, OY>(
        &self,
        input: &I,
        dfdx: &mut OX,
        dfdy: &mut OY,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read2D<F> + ?Sized,
        OX: Write2D<F> + ?Sized,
        OY: Write2D<F> + ?Sized,
    {
        let input = input.read_view();
        let expected = input.dim();
        let mut dfdx = dfdx.write_view_mut();
        if dfdx.dim() != expected {
            return Err(ExecInvariantViolation::ShapeMismatch {
                arg: "dfdx",
                expected,
                got: dfdx.dim(),
            });
        }
        let mut dfdy = dfdy.write_view_mut();
        if dfdy.dim() != expected {
            return Err(ExecInvariantViolation::ShapeMismatch {
                arg: "dfdy",
                expected,
                got: dfdy.dim(),
            });
        }

        let (dx, dy) = self.differentiate(input)?;
        dfdx.assign(&dx);
        dfdy.assign(&dy);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> Result<(Array2<F>, Array2<F>), ExecInvariantViolation>
    where
        I: Read2D<F> + ?Sized,
    {
        self.differentiate(input.read_view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::derivative::periodic_grid;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wavenumbers_follow_fft_bin_order() {
        let k = wavenumbers(4, 4.0f64).expect("valid grid");
        let expected = [0.0, 0.25, -0.5, -0.25].map(|f| f * core::f64::consts::TAU);
        k.iter()
            .zip(expected.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(*a, *b, epsilon = 1e-12));
    }

    #[test]
    fn derivative_kernel_rejects_bad_width() {
        for length in [0.0f64, -1.0, f64::INFINITY, f64::NAN] {
            let err = SpectralDerivativeKernel::try_new(SpectralDerivativeConfig { length })
                .expect_err("invalid width");
            assert!(matches!(
                err,
                ConfigError::InvalidArgument { arg: "length", .. }
            ));
        }
    }

    #[test]
    fn derivative_of_sine_is_cosine() {
        let n = 64;
        let length = core::f64::consts::TAU;
        let x = periodic_grid(n, length);
        let f = x.mapv(|v| (3.0 * v).sin());
        let kernel = SpectralDerivativeKernel::try_new(SpectralDerivativeConfig { length })
            .expect("valid config");
        let df = kernel.run_alloc(&f).expect("kernel should run");
        df.iter()
            .zip(x.iter())
            .for_each(|(d, v)| assert_abs_diff_eq!(*d, 3.0 * (3.0 * v).cos(), epsilon = 1e-10));
    }

    #[test]
    fn derivative_of_constant_vanishes() {
        let kernel = SpectralDerivativeKernel::try_new(SpectralDerivativeConfig { length: 2.0f32 })
            .expect("valid config");
        let df = kernel.run_alloc(&[1.5f32; 7]).expect("kernel should run");
        df.iter()
            .for_each(|d| assert_abs_diff_eq!(*d, 0.0, epsilon = 1e-5));
    }

    #[test]
    fn derivative_kernel_contracts_validate_input_and_output() {
        let kernel = SpectralDerivativeKernel::try_new(SpectralDerivativeConfig { length: 1.0 })
            .expect("valid config");
        let empty: [f64; 0] = [];
        assert!(matches!(
            kernel.run_alloc(&empty),
            Err(ExecInvariantViolation::InvalidState { .. })
        ));

        let input = [0.0f64, 1.0, 0.0, -1.0];
        let mut out = [0.0f64; 3];
        let err = kernel
            .run_into(&input, &mut out)
            .expect_err("mismatched output length should error");
        assert!(matches!(err, ExecInvariantViolation::LengthMismatch { .. }));
    }

    #[test]
    fn gradient_kernel_rejects_bad_widths() {
        assert!(SpectralGradientKernel::try_new(SpectralGradientConfig { lx: 1.0, ly: 0.0 }).is_err());
        assert!(SpectralGradientKernel::try_new(SpectralGradientConfig { lx: -2.0, ly: 1.0 }).is_err());
    }

    #[test]
    fn gradient_of_plane_wave_on_rectangular_grid() {
        let (nx, ny) = (32, 24);
        let (lx, ly) = (core::f64::consts::TAU, 2.0 * core::f64::consts::TAU);
        let x = periodic_grid(nx, lx);
        let y = periodic_grid(ny, ly);
        // sin(2x) * cos(y)
        let f = Array2::from_shape_fn((ny, nx), |(i, j)| (2.0 * x[j]).sin() * y[i].cos());

        let kernel = SpectralGradientKernel::try_new(SpectralGradientConfig { lx, ly })
            .expect("valid config");
        let (dfdx, dfdy) = kernel.run_alloc(&f).expect("kernel should run");
        for i in 0..ny {
            for j in 0..nx {
                let fx = 2.0 * (2.0 * x[j]).cos() * y[i].cos();
                let fy = -(2.0 * x[j]).sin() * y[i].sin();
                assert_abs_diff_eq!(dfdx[[i, j]], fx, epsilon = 1e-10);
                assert_abs_diff_eq!(dfdy[[i, j]], fy, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn gradient_kernel_run_into_checks_shapes() {
        let kernel = SpectralGradientKernel::try_new(SpectralGradientConfig { lx: 1.0, ly: 1.0 })
            .expect("valid config");
        let f = Array2::<f64>::zeros((4, 6));
        let mut dfdx = Array2::<f64>::zeros((4, 6));
        let mut dfdy = Array2::<f64>::zeros((6, 4));
        let err = kernel
            .run_into(&f, &mut dfdx, &mut dfdy)
            .expect_err("transposed output should error");
        assert_eq!(
            err,
            ExecInvariantViolation::ShapeMismatch {
                arg: "dfdy",
                expected: (4, 6),
                got: (6, 4),
            }
        );

        let mut dfdy = Array2::<f64>::ones((4, 6));
        kernel
            .run_into(&f, &mut dfdx, &mut dfdy)
            .expect("matching outputs");
        assert!(dfdy.iter().all(|v| v.abs() < 1e-12));
    }
}
