//! Interlaced field-pair processing.
//!
//! An interlaced frame is converted as two independent half-height passes,
//! one per field, each with its chroma phase shifted a quarter chroma row
//! in opposite directions. The two graphs share nothing, so they can run
//! concurrently on separate `tmp` allocations.

use vfc_core::{FieldParity, ImageFormat};

use crate::builder::{build_filter_graph, GraphBuilderParams};
use crate::error::{GraphError, GraphResult};
use crate::graph::FilterGraph;
#[cfg(feature = "parallel")]
use crate::{graph::Callback, ImageBuffer};

/// Derives the half-height field format of a frame format.
fn field_format(frame: &ImageFormat, parity: FieldParity) -> GraphResult<ImageFormat> {
    if frame.height % 2 != 0 {
        return Err(GraphError::InvalidArgument(
            "interlaced frame height must be a multiple of 2".into(),
        ));
    }
    let mut field = *frame;
    field.height = frame.height / 2;
    field.field_parity = parity;
    Ok(field)
}

/// Builds the top- and bottom-field graphs for an interlaced conversion.
///
/// `src` and `dst` describe the full frames; each returned graph converts
/// one half-height field with the appropriate chroma phase.
pub fn build_field_graphs(
    src: &ImageFormat,
    dst: &ImageFormat,
    params: &GraphBuilderParams,
) -> GraphResult<(FilterGraph, FilterGraph)> {
    let top = build_filter_graph(
        &field_format(src, FieldParity::Top)?,
        &field_format(dst, FieldParity::Top)?,
        params,
    )?;
    let bottom = build_filter_graph(
        &field_format(src, FieldParity::Bottom)?,
        &field_format(dst, FieldParity::Bottom)?,
        params,
    )?;
    Ok((top, bottom))
}

/// Argument pack for one field of [`process_fields`].
#[cfg(feature = "parallel")]
pub struct FieldPass<'a> {
    /// The field's graph.
    pub graph: &'a FilterGraph,
    /// Source buffer holding the field's lines.
    pub src: &'a ImageBuffer,
    /// Destination buffer for the field's lines.
    pub dst: &'a ImageBuffer,
    /// Temporary memory for this pass; not shared with the other field.
    pub tmp: &'a mut [u8],
    /// Per-group source callback.
    pub unpack: Callback<'a>,
    /// Per-group sink callback.
    pub pack: Callback<'a>,
}

#[cfg(feature = "parallel")]
struct AssertSend<T>(T);

// Field passes reference disjoint buffers; the caller guarantees the two
// packs do not alias, which is what moving them across threads requires.
#[cfg(feature = "parallel")]
unsafe impl<T> Send for AssertSend<T> {}

/// Runs the two field passes concurrently.
///
/// The passes must reference disjoint destination and `tmp` memory; source
/// buffers may be shared views of the same frame as long as any callbacks
/// are independent.
#[cfg(feature = "parallel")]
pub fn process_fields(top: FieldPass<'_>, bottom: FieldPass<'_>) -> GraphResult<()> {
    let top = AssertSend(top);
    let bottom = AssertSend(bottom);

    let (a, b) = rayon::join(
        move || {
            let top = top;
            let AssertSend(pass) = top;
            pass.graph
                .process(pass.src, pass.dst, pass.tmp, pass.unpack, pass.pack)
        },
        move || {
            let bottom = bottom;
            let AssertSend(pass) = bottom;
            pass.graph
                .process(pass.src, pass.dst, pass.tmp, pass.unpack, pass.pack)
        },
    );
    a?;
    b
}
