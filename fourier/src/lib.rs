//! Discrete Fourier transform applications.
//!
//! * [`signal::convolve`]: linear convolution through zero-padded FFT products.
//! * [`signal::derivative`]: spectral derivatives of sampled 1D signals and 2D fields.
//! * [`signal::epicycles`]: per-frequency partial sums of a planar curve's DFT,
//!   the raw material of epicycle animations.
//! * [`signal::wave`]: the curves and pulses the demo applications feed in.
//!
//! Kernels follow a config/validate/run lifecycle (see [`kernel`]); each also has a
//! free-function shortcut for one-off calls.

#![deny(missing_docs)]

/// Error types for fallible free functions.
pub mod error;

/// Shared kernel lifecycle and buffer adapters.
pub mod kernel;

/// Signal-processing kernels.
pub mod signal;

/// Debug plotting through an external Python interpreter.
pub mod plot;

pub use error::Error;
pub use fourier_core::num_rs;

/// Re-export of `nalgebra`, whose `RealField` bounds the curve generators.
pub use nalgebra as na;
