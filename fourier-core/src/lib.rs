//! numpy-parity primitives underpinning the `fourier` crate.
//!
//! [`num_rs`] mirrors the parts of `numpy` the kernels lean on: the
//! forward/inverse FFT family, frequency-bin helpers and direct linear
//! convolution.

#![deny(missing_docs)]

use core::{error, fmt};

pub mod num_rs;

/// Errors raised by `fourier-core` primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument was outside the accepted domain.
    InvalidArg {
        /// The invalid arg.
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// An input array had no samples along a required axis.
    EmptyInput {
        /// Name of the empty argument.
        arg: String,
    },
    /// `ndarray-conv` failed to convolve the operands.
    Conv {
        /// Message reported by `ndarray-conv`.
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid_arg(arg: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArg {
            arg: arg.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn empty(arg: &str) -> Self {
        Error::EmptyInput {
            arg: arg.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => write!(f, "Invalid argument `{arg}`: {reason}"),
            Error::EmptyInput { arg } => write!(f, "Input `{arg}` cannot be empty."),
            Error::Conv { reason } => write!(f, "Convolution failed: {reason}"),
        }
    }
}

impl error::Error for Error {}

/// Result alias for `fourier-core` operations.
pub type Result<T> = core::result::Result<T, Error>;
