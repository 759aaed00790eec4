//! Error types for resampler construction.

use thiserror::Error;

/// Result type for resampler construction.
pub type ResizeResult<T> = Result<T, ResizeError>;

/// Errors raised while building resampling filters.
///
/// Kernels themselves cannot fail; all validation happens when coefficient
/// contexts and filter instances are constructed.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// Source or target dimension is zero or inconsistent.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// The filter footprint exceeds the input dimension.
    #[error("filter width {filter_width} exceeds input dimension {input_width}")]
    FilterTooWide {
        /// Taps per output sample.
        filter_width: u32,
        /// Input dimension in samples.
        input_width: u32,
    },

    /// Coefficient table size overflowed.
    #[error(transparent)]
    Core(#[from] vfc_core::CoreError),
}
