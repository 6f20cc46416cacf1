use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::{error, fmt};

/// Errors raised by the free-function entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Argument passed into function was invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Kernel construction rejected its configuration.
    Config(ConfigError),
    /// Execution was attempted with a violated kernel invariant.
    ExecInvariantViolation(ExecInvariantViolation),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::Config(err) => write!(f, "{err}"),
            Error::ExecInvariantViolation(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::InvalidArg { .. } => None,
            Error::Config(err) => Some(err),
            Error::ExecInvariantViolation(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Config(value)
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        Error::ExecInvariantViolation(value)
    }
}
