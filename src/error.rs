//! Error types for percolation-sim

use thiserror::Error;

/// Crate-wide error type.
///
/// Once a study configuration has been validated, neither the flood fill nor the
/// aggregation can fail, so the only runtime failure left is the random source.
#[derive(Error, Debug)]
pub enum PercolationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Random source failure: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PercolationError {
    fn from(e: serde_json::Error) -> Self {
        PercolationError::Config(e.to_string())
    }
}

impl From<std::io::Error> for PercolationError {
    fn from(e: std::io::Error) -> Self {
        PercolationError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PercolationError>;

/// Shorthand for building an `InvalidArgument` error.
pub(crate) fn invalid(msg: impl Into<String>) -> PercolationError {
    PercolationError::InvalidArgument(msg.into())
}

/// Reject probabilities outside `[0, 1]` (NaN included).
pub(crate) fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(invalid(format!("probability p={} is outside [0, 1]", p)))
    }
}
