//! Error types for core format and buffer validation.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised by format validation and allocation sizing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Image or plane dimensions are inconsistent or zero.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Image format fields are mutually inconsistent.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A size computation overflowed the platform pointer width.
    #[error("size overflow: {0}")]
    SizeOverflow(String),
}
