//! Error types for graph construction and execution.

use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by graph build and execution.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An argument or graph mutation was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The source/target format pair has no conversion path.
    #[error("unsupported conversion: {0}")]
    Unsupported(String),

    /// A size computation overflowed, or a buffer was too small.
    #[error("resource limit: {0}")]
    Resource(String),

    /// A caller-supplied ring buffer cannot hold the required window.
    #[error("buffer window of {supplied} lines is less than the required {required}")]
    InsufficientBuffering {
        /// Lines held by the supplied buffer.
        supplied: u32,
        /// Lines the graph requires.
        required: u32,
    },

    /// A user callback returned a non-zero code; the run was aborted.
    #[error("user callback failed with code {0}")]
    Callback(i32),

    /// Core format validation failed.
    #[error(transparent)]
    Core(#[from] vfc_core::CoreError),

    /// Resampler construction failed.
    #[error(transparent)]
    Resize(#[from] vfc_resize::ResizeError),

    /// Depth-conversion construction failed.
    #[error(transparent)]
    Depth(#[from] vfc_depth::DepthError),

    /// Colorspace plan synthesis failed.
    #[error(transparent)]
    Color(#[from] vfc_color::ColorError),
}
