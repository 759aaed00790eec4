//! Error types for depth-conversion construction.

use thiserror::Error;

/// Result type for depth-conversion construction.
pub type DepthResult<T> = Result<T, DepthError>;

/// Errors raised while building depth-conversion filters.
#[derive(Debug, Error)]
pub enum DepthError {
    /// The requested format pair has no conversion path.
    #[error("unsupported conversion: {0}")]
    Unsupported(String),

    /// A format field is out of range.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}
