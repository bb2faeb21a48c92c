//! Error types for the WarpGrid autoscaler.

use thiserror::Error;

/// Result type alias for autoscaler operations.
pub type AutoscaleResult<T> = Result<T, AutoscaleError>;

/// Errors that can occur while assembling or decoding decider results.
#[derive(Debug, Error)]
pub enum AutoscaleError {
    /// The caller handed in something that can never form a valid
    /// evaluation (no deciders, duplicate names). Not retryable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed wire data: {0}")]
    Malformed(String),

    #[error("unknown decider reason: {0}")]
    UnknownReason(String),
}
