use thiserror::Error;

/// Failures that stop a chain. Numerical divergence is not among them, it is
/// reported through [`crate::kernel::TransitionStats::divergent`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid sampler configuration, detected before any iteration runs.
    #[error("config error: {0}")]
    Config(String),

    /// A vector did not have the dimensionality of the target.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    Dimension { expected: usize, found: usize },

    /// The log-density / gradient oracle itself failed.
    #[error("gradient oracle failed: {0}")]
    Gradient(String),
}

pub type Result<T> = std::result::Result<T, Error>;
