//! Behavioural ports of the `numpy` routines the kernels are built from.

mod convolve;
mod fft;

pub use convolve::*;
pub use fft::*;
