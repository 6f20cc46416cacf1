//! Trait-first kernels for demo curve and pulse generation.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::{CurveGenerate2D, Pulse1D};
use nalgebra::RealField;

fn all_finite<F: RealField + Copy>(values: &[F]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn curve_into<F, K, I, OX, OY>(
    kernel: &K,
    theta: &I,
    x: &mut OX,
    y: &mut OY,
) -> Result<(), ExecInvariantViolation>
where
    F: Copy,
    K: Fn(F) -> (F, F),
    I: Read1D<F> + ?Sized,
    OX: Write1D<F> + ?Sized,
    OY: Write1D<F> + ?Sized,
{
    let theta = theta.read_slice().map_err(ExecInvariantViolation::from)?;
    let x = x.write_slice_mut().map_err(ExecInvariantViolation::from)?;
    if x.len() != theta.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "x",
            expected: theta.len(),
            got: x.len(),
        });
    }
    let y = y.write_slice_mut().map_err(ExecInvariantViolation::from)?;
    if y.len() != theta.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "y",
            expected: theta.len(),
            got: y.len(),
        });
    }
    for ((t, x), y) in theta.iter().zip(x.iter_mut()).zip(y.iter_mut()) {
        (*x, *y) = kernel(*t);
    }
    Ok(())
}

fn curve_alloc<F, K, I>(kernel: &K, theta: &I) -> Result<(Vec<F>, Vec<F>), ExecInvariantViolation>
where
    F: Copy,
    K: Fn(F) -> (F, F),
    I: Read1D<F> + ?Sized,
{
    let theta = theta.read_slice().map_err(ExecInvariantViolation::from)?;
    Ok(theta.iter().map(|t| kernel(*t)).unzip())
}

/// Constructor config for [`HatKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatConfig {
    /// Leading zeros.
    pub n1: usize,
    /// Ones in the pulse.
    pub n2: usize,
    /// Trailing zeros.
    pub n3: usize,
}

/// Rectangular pulse generator: `n1` zeros, `n2` ones, `n3` zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatKernel {
    n1: usize,
    n2: usize,
    n3: usize,
}

impl HatKernel {
    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.n1 + self.n2 + self.n3
    }

    /// Always false; construction rejects empty pulses.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(super) fn fill<F: RealField + Copy>(&self, out: &mut [F]) {
        for (i, v) in out.iter_mut().enumerate() {
            *v = if (self.n1..self.n1 + self.n2).contains(&i) {
                F::one()
            } else {
                F::zero()
            };
        }
    }
}

impl KernelLifecycle for HatKernel {
    type Config = HatConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let total = config
            .n1
            .checked_add(config.n2)
            .and_then(|n| n.checked_add(config.n3));
        match total {
            None => Err(ConfigError::InvalidArgument {
                arg: "n1 + n2 + n3",
                reason: "pulse length overflows usize",
            }),
            Some(0) => Err(ConfigError::InvalidArgument {
                arg: "n1 + n2 + n3",
                reason: "pulse must have at least one sample",
            }),
            Some(_) => Ok(Self {
                n1: config.n1,
                n2: config.n2,
                n3: config.n3,
            }),
        }
    }
}

impl<F> Pulse1D<F> for HatKernel
where
    F: RealField + Copy,
{
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if out.len() != self.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.len(),
                got: out.len(),
            });
        }
        self.fill(out);
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<F>, ExecInvariantViolation> {
        let mut out = vec![F::zero(); self.len()];
        self.fill(&mut out);
        Ok(out)
    }
}

/// Constructor config for [`LissajousKernel`].
///
/// `x = A·sin(a·θ + δ)`, `y = B·sin(b·θ)`. The figure is most sensitive to the
/// ratio `a / b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LissajousConfig<F> {
    /// `A`, the horizontal amplitude.
    pub x_amplitude: F,
    /// `B`, the vertical amplitude.
    pub y_amplitude: F,
    /// Horizontal angular frequency.
    pub a: F,
    /// Vertical angular frequency.
    pub b: F,
    /// Horizontal phase shift.
    pub delta: F,
}

/// Trait-first Lissajous curve generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LissajousKernel<F> {
    config: LissajousConfig<F>,
}

impl<F> LissajousKernel<F>
where
    F: RealField + Copy,
{
    pub(super) fn sample(&self, theta: F) -> (F, F) {
        let c = &self.config;
        (
            c.x_amplitude * (c.a * theta + c.delta).sin(),
            c.y_amplitude * (c.b * theta).sin(),
        )
    }
}

impl<F> KernelLifecycle for LissajousKernel<F>
where
    F: RealField + Copy,
{
    type Config = LissajousConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let c = &config;
        if !all_finite(&[c.x_amplitude, c.y_amplitude, c.a, c.b, c.delta]) {
            return Err(ConfigError::InvalidArgument {
                arg: "lissajous",
                reason: "amplitudes, frequencies and phase must be finite",
            });
        }
        Ok(Self { config })
    }
}

impl<F> CurveGenerate2D<F> for LissajousKernel<F>
where
    F: RealField + Copy,
{
    fn run_into<I, OX, OY>(
        &self,
        theta: &I,
        x: &mut OX,
        y: &mut OY,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        OX: Write1D<F> + ?Sized,
        OY: Write1D<F> + ?Sized,
    {
        curve_into::<F, _, _, _, _>(&|t| self.sample(t), theta, x, y)
    }

    fn run_alloc<I>(&self, theta: &I) -> Result<(Vec<F>, Vec<F>), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        curve_alloc::<F, _, _>(&|t| self.sample(t), theta)
    }
}

/// Constructor config for [`HarmonographKernel`].
///
/// Four damped pendulums, two per axis:
///
/// ```text
/// x = A₀·sin(f₀θ + p₀)·e^(-d₀θ) + A₁·sin(f₁θ + p₁)·e^(-d₁θ)
/// y = A₂·sin(f₂θ + p₂)·e^(-d₂θ) + A₃·sin(f₃θ + p₃)·e^(-d₃θ)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonographConfig<F> {
    /// Pendulum amplitudes.
    pub amplitudes: [F; 4],
    /// Pendulum angular frequencies.
    pub frequencies: [F; 4],
    /// Pendulum phase shifts.
    pub phases: [F; 4],
    /// Exponential decay rates, `>= 0`.
    pub decays: [F; 4],
}

/// Trait-first harmonograph curve generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonographKernel<F> {
    config: HarmonographConfig<F>,
}

impl<F> HarmonographKernel<F>
where
    F: RealField + Copy,
{
    fn pendulum(&self, i: usize, theta: F) -> F {
        let c = &self.config;
        c.amplitudes[i] * (c.frequencies[i] * theta + c.phases[i]).sin() * (-c.decays[i] * theta).exp()
    }

    pub(super) fn sample(&self, theta: F) -> (F, F) {
        (
            self.pendulum(0, theta) + self.pendulum(1, theta),
            self.pendulum(2, theta) + self.pendulum(3, theta),
        )
    }
}

impl<F> KernelLifecycle for HarmonographKernel<F>
where
    F: RealField + Copy,
{
    type Config = HarmonographConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        let c = &config;
        if !(all_finite(&c.amplitudes) && all_finite(&c.frequencies) && all_finite(&c.phases)) {
            return Err(ConfigError::InvalidArgument {
                arg: "harmonograph",
                reason: "amplitudes, frequencies and phases must be finite",
            });
        }
        if !all_finite(&c.decays) || c.decays.iter().any(|d| *d < F::zero()) {
            return Err(ConfigError::InvalidArgument {
                arg: "decays",
                reason: "decay rates must be finite and >= 0",
            });
        }
        Ok(Self { config })
    }
}

impl<F> CurveGenerate2D<F> for HarmonographKernel<F>
where
    F: RealField + Copy,
{
    fn run_into<I, OX, OY>(
        &self,
        theta: &I,
        x: &mut OX,
        y: &mut OY,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        OX: Write1D<F> + ?Sized,
        OY: Write1D<F> + ?Sized,
    {
        curve_into::<F, _, _, _, _>(&|t| self.sample(t), theta, x, y)
    }

    fn run_alloc<I>(&self, theta: &I) -> Result<(Vec<F>, Vec<F>), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        curve_alloc::<F, _, _>(&|t| self.sample(t), theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn hat_kernel_places_ones_between_zero_runs() {
        let kernel = HatKernel::try_new(HatConfig { n1: 2, n2: 3, n3: 1 }).expect("valid config");
        let pulse: Vec<f64> = kernel.run_alloc().expect("kernel should run");
        assert_eq!(pulse, vec![0.0, 0.0, 1.0, 1.0, 1.0, 0.0]);

        let mut short = [0.0f32; 5];
        let err = Pulse1D::<f32>::run_into(&kernel, &mut short)
            .expect_err("mismatched output length should error");
        assert!(matches!(err, ExecInvariantViolation::LengthMismatch { .. }));
    }

    #[test]
    fn hat_kernel_rejects_empty_pulse() {
        assert!(HatKernel::try_new(HatConfig { n1: 0, n2: 0, n3: 0 }).is_err());
        assert!(HatKernel::try_new(HatConfig {
            n1: usize::MAX,
            n2: 1,
            n3: 0,
        })
        .is_err());
    }

    #[test]
    fn lissajous_kernel_matches_closed_form() {
        let kernel = LissajousKernel::try_new(LissajousConfig {
            x_amplitude: 3.0,
            y_amplitude: 2.0,
            a: 1.0,
            b: 3.0,
            delta: FRAC_PI_2,
        })
        .expect("valid config");
        let theta = [0.0, 0.25 * PI, 0.5 * PI, PI];
        let (x, y) = kernel.run_alloc(&theta).expect("kernel should run");
        for ((t, x), y) in theta.iter().zip(x.iter()).zip(y.iter()) {
            assert_abs_diff_eq!(*x, 3.0 * t.cos(), epsilon = 1e-12);
            assert_abs_diff_eq!(*y, 2.0 * (3.0 * t).sin(), epsilon = 1e-12);
        }
    }

    #[test]
    fn lissajous_kernel_rejects_non_finite_parameters() {
        let err = LissajousKernel::try_new(LissajousConfig {
            x_amplitude: f64::NAN,
            y_amplitude: 1.0,
            a: 1.0,
            b: 1.0,
            delta: 0.0,
        })
        .expect_err("nan amplitude");
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    fn demo_harmonograph() -> HarmonographConfig<f64> {
        HarmonographConfig {
            amplitudes: [2.0, 6.0, 1.2, 3.0],
            frequencies: [2.0, 6.0, 1.0, 2.0],
            phases: [PI / 16.0, PI / 2.0, PI / 16.0, PI],
            decays: [0.02, 0.0315, 0.02, 0.02],
        }
    }

    #[test]
    fn harmonograph_kernel_decays_towards_origin() {
        let kernel = HarmonographKernel::try_new(demo_harmonograph()).expect("valid config");
        let (x0, y0) = kernel.sample(0.0);
        assert_abs_diff_eq!(x0, 2.0 * (PI / 16.0).sin() + 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y0, 1.2 * (PI / 16.0).sin(), epsilon = 1e-12);

        let theta: Vec<f64> = (0..2000).map(|i| i as f64 * 0.5).collect();
        let mut x = vec![0.0; theta.len()];
        let mut y = vec![0.0; theta.len()];
        kernel
            .run_into(&theta, &mut x, &mut y)
            .expect("run_into should succeed");
        let envelope = 2.0 + 6.0;
        assert!(x.iter().all(|v| v.abs() <= envelope));
        assert!(x[1999].abs() < 1e-6 && y[1999].abs() < 1e-6);
    }

    #[test]
    fn harmonograph_kernel_rejects_negative_decay() {
        let mut config = demo_harmonograph();
        config.decays[2] = -0.1;
        let err = HarmonographKernel::try_new(config).expect_err("negative decay");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "decays",
                reason: "decay rates must be finite and >= 0",
            }
        );
    }

    #[test]
    fn curve_run_into_checks_both_outputs() {
        let kernel = HarmonographKernel::try_new(demo_harmonograph()).expect("valid config");
        let theta = [0.0, 1.0, 2.0];
        let mut x = [0.0; 3];
        let mut y = [0.0; 2];
        let err = kernel
            .run_into(&theta, &mut x, &mut y)
            .expect_err("short y should error");
        assert_eq!(
            err,
            ExecInvariantViolation::LengthMismatch {
                arg: "y",
                expected: 3,
                got: 2,
            }
        );
    }
}
