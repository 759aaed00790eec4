//! Error types for colorspace plan synthesis.

use thiserror::Error;

/// Result type for colorspace operations.
pub type ColorResult<T> = Result<T, ColorError>;

/// Errors raised while deriving colorspace conversions.
#[derive(Debug, Error)]
pub enum ColorError {
    /// Conversion requires a matrix/transfer/primaries value that is
    /// unspecified or has no supported derivation.
    #[error("unsupported colorspace conversion: {0}")]
    Unsupported(String),

    /// A derived matrix was singular.
    #[error("non-invertible colorspace matrix: {0}")]
    SingularMatrix(String),
}
