//! Start-up configuration.
//!
//! The reduction strategy is chosen once, before any kernel runs. Its default
//! is fixed at build time by `TRANSMUL_KERNEL` (see `build.rs`); the
//! environment can override it when the process starts.
//!
//! | variable            | meaning                                 | default                   |
//! |---------------------|-----------------------------------------|---------------------------|
//! | `TRANSMUL_STRATEGY` | `basic` or `unrolled`                   | build-time choice         |
//! | `TRANSMUL_UNITS`    | units requested for parallel calls      | available parallelism     |

use std::env;
use std::num::NonZeroUsize;
use std::thread;

use tracing::debug;

use crate::error::{config_error, Result};
use crate::kernel::Strategy;

pub const STRATEGY_ENV: &str = "TRANSMUL_STRATEGY";
pub const UNITS_ENV: &str = "TRANSMUL_UNITS";

/// How a [`TransMul`](crate::TransMul) runs its kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Reduction strategy for every call.
    pub strategy: Strategy,
    /// Units requested for parallel calls.
    pub units: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::BUILD_DEFAULT,
            units: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by `TRANSMUL_STRATEGY` and `TRANSMUL_UNITS`.
    ///
    /// # Errors
    ///
    /// Returns [`TransmulError::Config`](crate::TransmulError::Config) if a
    /// variable is set to something unparsable, or `TRANSMUL_UNITS` is zero.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(STRATEGY_ENV) {
            config.strategy = value.parse()?;
        }

        if let Some(value) = lookup(UNITS_ENV) {
            config.units = match value.trim().parse::<usize>() {
                Ok(0) => return Err(config_error(format!("{UNITS_ENV} must be at least 1"))),
                Ok(units) => units,
                Err(e) => return Err(config_error(format!("{UNITS_ENV}=`{value}`: {e}"))),
            };
        }

        debug!(strategy = %config.strategy, units = config.units, "kernel configuration");
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_units(mut self, units: usize) -> Self {
        self.units = units;
        self
    }
}
