//! Error types for transmul operations.
//!
//! Everything here is raised at the call boundary, before any unit is forked.
//! The reduction loops themselves never fail.

use thiserror::Error;

use crate::team::Domain;

/// Errors that can occur while setting up a transposed matrix multiplication.
#[derive(Error, Debug)]
pub enum TransmulError {
    /// The parallel entry point was called outside the compute cluster.
    #[error("parallel processing supported only for cluster side (called from {domain})")]
    WrongDomain {
        /// Domain the caller was running on.
        domain: Domain,
    },

    /// A buffer extent disagrees with the declared matrix shape.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which operand or dimension was wrong.
        what: &'static str,
        /// Expected extent.
        expected: usize,
        /// Actual extent.
        actual: usize,
    },

    /// A team must have at least one unit.
    #[error("Invalid unit count: {0} (a team needs at least one unit)")]
    InvalidUnits(usize),

    /// A configuration value could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An ndarray view is not contiguous row-major.
    #[error("Layout error: {0}")]
    Layout(String),

    /// The host thread pool could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for transmul operations.
pub type Result<T> = std::result::Result<T, TransmulError>;

/// Creates a dimension mismatch error.
pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> TransmulError {
    TransmulError::DimensionMismatch {
        what,
        expected,
        actual,
    }
}

/// Creates a configuration error.
pub fn config_error(message: impl Into<String>) -> TransmulError {
    TransmulError::Config(message.into())
}
