use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
///
/// Everything that can be checked before seeing input data (domain widths,
/// modes, curve parameters) is checked once in `try_new`, so a constructed
/// kernel only fails at run time on input shape.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KernelLifecycle};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct GridConfig {
        width: f64,
        samples: usize,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct GridKernel {
        spacing: f64,
    }

    impl KernelLifecycle for GridKernel {
        type Config = GridConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            if config.samples == 0 {
                return Err(ConfigError::InvalidArgument {
                    arg: "samples",
                    reason: "samples must be > 0",
                });
            }
            Ok(Self {
                spacing: config.width / config.samples as f64,
            })
        }
    }

    #[test]
    fn lifecycle_constructor_accepts_valid_config() {
        let kernel = GridKernel::try_new(GridConfig {
            width: 10.0,
            samples: 4,
        })
        .expect("valid config");
        assert_eq!(kernel.spacing, 2.5);
    }

    #[test]
    fn lifecycle_constructor_rejects_invalid_config() {
        let err = GridKernel::try_new(GridConfig {
            width: 10.0,
            samples: 0,
        })
        .expect_err("invalid config");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "samples",
                reason: "samples must be > 0",
            }
        );
    }
}
