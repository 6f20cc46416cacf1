//! Signal-processing kernels built on the discrete Fourier transform.

use num_traits::{Float, NumCast};

/// Linear convolution through zero-padded FFT products.
pub mod convolve;

/// Spectral derivatives of 1D signals and 2D fields.
pub mod derivative;

/// DFT partial sums of planar curves for epicycle animation.
pub mod epicycles;

/// Trait interfaces for the kernels in this module.
pub mod traits;

/// Demo input curves and pulses.
pub mod wave;

/// Lift an `f64` constant into the working precision.
pub(crate) fn lit<F: Float>(v: f64) -> F {
    <F as NumCast>::from(v).unwrap_or_else(F::nan)
}

/// Lift a sample count into the working precision.
pub(crate) fn count<F: Float>(n: usize) -> F {
    <F as NumCast>::from(n).unwrap_or_else(F::nan)
}
