//! The line-buffered filter interface.
//!
//! Every transform in a filter graph implements [`Filter`]: it declares its
//! output shape and scheduling constraints through a [`FilterDescriptor`],
//! reports per-row and per-column dependencies, and produces output rows
//! from ring-buffered inputs in [`Filter::process`].
//!
//! # Scheduling contract
//!
//! - `row_deps(i)` is half-open: the input rows required to compute output
//!   rows `[i, i + step)`.
//! - `col_deps(left, right)` is the input column range needed to produce
//!   output columns `[left, right)`.
//! - `process` writes output rows `[i, i + step)`, columns `[left, right)`,
//!   reading only the rows and columns it declared.
//!
//! The graph engine guarantees that declared input rows have been produced
//! before `process` is entered, and that input and output buffers do not
//! alias unless the filter sets [`FilterFlags::in_place`].

use crate::linebuf::LineBuffer;

/// Maximum number of planes a node may produce or consume.
pub const MAX_PLANES: usize = 4;

/// Shape of one image plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneDescriptor {
    /// Width in samples.
    pub width: u32,
    /// Height in lines.
    pub height: u32,
    /// Size of one sample in bytes.
    pub bytes_per_sample: u32,
}

impl PlaneDescriptor {
    /// Creates a descriptor.
    pub const fn new(width: u32, height: u32, bytes_per_sample: u32) -> Self {
        Self {
            width,
            height,
            bytes_per_sample,
        }
    }
}

/// Scheduling flags of a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFlags {
    /// Each output row depends only on the input row with the same index.
    pub same_row: bool,
    /// `process` must always be called with the full row, `(0, width)`.
    pub entire_row: bool,
    /// The filter needs the whole image; its rings collapse to unbounded.
    pub entire_plane: bool,
    /// Input and output buffers may reference the same memory.
    pub in_place: bool,
}

/// What a transform exposes to the graph.
#[derive(Debug, Clone, Copy)]
pub struct FilterDescriptor {
    /// Shape shared by all output planes of the filter.
    pub format: PlaneDescriptor,
    /// Number of input planes consumed.
    pub num_deps: u32,
    /// Number of output planes produced.
    pub num_planes: u32,
    /// Output rows produced by a single `process` call.
    pub step: u32,
    /// Required horizontal alignment of `[left, right)` spans, as a mask.
    pub alignment_mask: u32,
    /// Bytes of per-run persistent context, zeroed then passed to
    /// [`Filter::init_context`] before the first `process` call.
    pub context_size: usize,
    /// Bytes of per-call temporary memory.
    pub scratchpad_size: usize,
    /// Scheduling flags.
    pub flags: FilterFlags,
}

impl FilterDescriptor {
    /// A single-plane, row-at-a-time descriptor with no context or scratch.
    pub fn pointwise(format: PlaneDescriptor) -> Self {
        Self {
            format,
            num_deps: 1,
            num_planes: 1,
            step: 1,
            alignment_mask: 0,
            context_size: 0,
            scratchpad_size: 0,
            flags: FilterFlags {
                same_row: true,
                in_place: true,
                ..Default::default()
            },
        }
    }
}

/// A line-oriented image transform.
///
/// Filters are immutable after construction; all per-run state lives in the
/// caller-provided context and scratchpad buffers.
pub trait Filter: Send + Sync {
    /// The filter's shape and scheduling constraints.
    fn descriptor(&self) -> &FilterDescriptor;

    /// Input rows `[top, bottom)` required to produce output rows
    /// `[i, i + step)`.
    fn row_deps(&self, i: u32) -> (u32, u32);

    /// Input columns `[col_left, col_right)` required to produce output
    /// columns `[left, right)`.
    fn col_deps(&self, left: u32, right: u32) -> (u32, u32);

    /// Initializes the per-run context. Called once per graph run with a
    /// zeroed buffer of `context_size` bytes.
    fn init_context(&self, _ctx: &mut [u8]) {}

    /// Produces output rows `[i, i + step)`, columns `[left, right)`.
    ///
    /// `deps` holds one view per input plane and `dst` one view per output
    /// plane. The engine upholds the buffer-validity contract documented in
    /// [`LineBuffer`]; a filter must read only the rows and columns it
    /// declared via [`row_deps`](Self::row_deps) /
    /// [`col_deps`](Self::col_deps).
    fn process(
        &self,
        deps: &[LineBuffer],
        dst: &[LineBuffer],
        i: u32,
        left: u32,
        right: u32,
        ctx: &mut [u8],
        scratch: &mut [u8],
    );
}
