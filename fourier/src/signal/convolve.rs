//! Linear convolution of real 1D signals computed through the FFT.

use crate::error::Error;
use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::Convolve1D;
use core::fmt;
use core::str::FromStr;
use fourier_core::num_rs::{fft, ifft, next_pow2_len};
use ndarray::Array1;
use num_traits::Float;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

/// Convolution mode determines the output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveMode {
    /// Every point of overlap, output size is `in1.len() + in2.len() - 1`.
    #[default]
    Full,
    /// Centered on the full output, size is `max(in1.len(), in2.len())`.
    Same,
}

impl ConvolveMode {
    /// Mode flags accepted by [`ConvolveMode::from_str`].
    pub const ACCEPTED: [&'static str; 2] = ["same", "full"];

    /// Output length for inputs of lengths `n1` and `n2`, both non-zero.
    pub fn output_len(self, n1: usize, n2: usize) -> usize {
        match self {
            ConvolveMode::Full => n1 + n2 - 1,
            ConvolveMode::Same => n1.max(n2),
        }
    }

    /// Number of leading samples dropped from the full convolution.
    fn leading_trim(self, n1: usize, n2: usize) -> usize {
        match self {
            ConvolveMode::Full => 0,
            ConvolveMode::Same => (n1 + n2 - 1 - n1.max(n2)) / 2,
        }
    }
}

impl FromStr for ConvolveMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(ConvolveMode::Full),
            "same" => Ok(ConvolveMode::Same),
            _ => Err(Error::InvalidArg {
                arg: "mode".to_string(),
                reason: "Acceptable mode flags are 'same' or 'full'.".to_string(),
            }),
        }
    }
}

impl fmt::Display for ConvolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvolveMode::Full => f.write_str("full"),
            ConvolveMode::Same => f.write_str("same"),
        }
    }
}

impl From<ConvolveMode> for fourier_core::num_rs::ConvolveMode {
    fn from(value: ConvolveMode) -> Self {
        match value {
            ConvolveMode::Full => fourier_core::num_rs::ConvolveMode::Full,
            ConvolveMode::Same => fourier_core::num_rs::ConvolveMode::Same,
        }
    }
}

/// Constructor config for [`ConvolveKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvolveConfig {
    /// Output-length mode.
    pub mode: ConvolveMode,
}

/// Trait-first FFT convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveKernel {
    mode: ConvolveMode,
}

impl ConvolveKernel {
    /// Return configured mode.
    pub fn mode(&self) -> ConvolveMode {
        self.mode
    }
}

impl KernelLifecycle for ConvolveKernel {
    type Config = ConvolveConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self { mode: config.mode })
    }
}

fn check_inputs<F>(in1: &[F], in2: &[F]) -> Result<(), ExecInvariantViolation> {
    if in1.is_empty() || in2.is_empty() {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "convolve inputs must be non-empty",
        });
    }
    Ok(())
}

impl<F> Convolve1D<F> for ConvolveKernel
where
    F: Float + FftNum,
{
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<F> + ?Sized,
        I2: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let in1 = in1.read_slice().map_err(ExecInvariantViolation::from)?;
        let in2 = in2.read_slice().map_err(ExecInvariantViolation::from)?;
        check_inputs(in1, in2)?;
        let out = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        let expected = self.mode.output_len(in1.len(), in2.len());
        if out.len() != expected {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected,
                got: out.len(),
            });
        }
        let y = fft_convolve_impl(in1, in2, self.mode)?;
        out.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I1: Read1D<F> + ?Sized,
        I2: Read1D<F> + ?Sized,
    {
        let in1 = in1.read_slice().map_err(ExecInvariantViolation::from)?;
        let in2 = in2.read_slice().map_err(ExecInvariantViolation::from)?;
        check_inputs(in1, in2)?;
        fft_convolve_impl(in1, in2, self.mode)
    }
}

fn fft_convolve_impl<F>(
    f1: &[F],
    f2: &[F],
    mode: ConvolveMode,
) -> Result<Vec<F>, ExecInvariantViolation>
where
    F: Float + FftNum,
{
    let full_size = f1.len() + f2.len() - 1;
    // Padding to at least `full_size` keeps the circular product linear
    let fft_size = next_pow2_len(full_size);
    tracing::debug!(
        n1 = f1.len(),
        n2 = f2.len(),
        full_size,
        fft_size,
        %mode,
        "fft convolve"
    );

    let lift = |x: &[F]| {
        x.iter()
            .map(|&v| Complex::new(v, F::zero()))
            .collect::<Array1<_>>()
    };
    let spec1 = fft(lift(f1).view(), Some(fft_size))?;
    let spec2 = fft(lift(f2).view(), Some(fft_size))?;
    let product = &spec1 * &spec2;
    let convolved = ifft(product.view(), None)?;

    let start = mode.leading_trim(f1.len(), f2.len());
    let len = mode.output_len(f1.len(), f2.len());
    Ok(convolved
        .iter()
        .skip(start)
        .take(len)
        .map(|c| c.re)
        .collect())
}

/// Convolve two real signals using the FFT.
///
/// Both signals are zero-padded to the next power of two at or above
/// `len(f1) + len(f2) - 1`, multiplied in the frequency domain, and
/// transformed back; the real part of the result is returned.
///
/// * `"full"` returns all `len(f1) + len(f2) - 1` samples.
/// * `"same"` returns `max(len(f1), len(f2))` samples centered on the full
///   output: `(full - max) / 2` samples are dropped from the front and the
///   remainder from the back, the back taking the extra sample when the
///   split is uneven. The leading offset is `(min(len) - 1) / 2` for every
///   length pair. The output length stays `max(len)` even when the lengths
///   differ in parity or the shorter signal has a single sample, where a
///   parity-based symmetric trim would give one sample more, one fewer, or
///   none at all.
///
/// The mode is validated before any computation.
///
/// ```
/// use fourier::signal::convolve::fft_convolve;
///
/// let y = fft_convolve(&[1.0f64, 2.0, 3.0], &[0.0, 1.0, 0.5], "same").unwrap();
/// let expected = [1.0, 2.5, 4.0];
/// for (a, b) in y.iter().zip(expected.iter()) {
///     assert!((a - b).abs() < 1e-12);
/// }
///
/// assert!(fft_convolve(&[1.0f64], &[1.0], "bogus").is_err());
/// ```
///
/// # Errors
/// [`Error::InvalidArg`] naming the accepted flags when `mode` is neither
/// `"full"` nor `"same"`; [`Error::ExecInvariantViolation`] when either
/// signal is empty.
pub fn fft_convolve<F>(f1: &[F], f2: &[F], mode: &str) -> Result<Vec<F>, Error>
where
    F: Float + FftNum,
{
    let mode: ConvolveMode = mode.parse()?;
    let kernel = ConvolveKernel::try_new(ConvolveConfig { mode })?;
    Ok(kernel.run_alloc(f1, f2)?)
}
