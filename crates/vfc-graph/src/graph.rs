//! The ring-buffered, line-driven filter graph engine.
//!
//! A graph is a DAG of nodes: one source, transform nodes wrapping
//! [`Filter`]s, and one sink. Construction is bracketed by
//! [`FilterGraph::new`] (the source) and [`FilterGraph::set_sink`], which
//! closes the graph and compiles it:
//!
//! 1. A dry run ("simulation") walks production in sink-row order and
//!    records, per node, the widest window of live rows any consumer ever
//!    needs.
//! 2. Windows round up to power-of-two ring sizes; every intermediate ring,
//!    filter context, and the shared scratchpad are assigned ranges within
//!    one `tmp` allocation sized by [`FilterGraph::get_tmp_size`].
//!
//! Execution pulls sink rows in order: each transform, asked for output
//! row `i`, first pulls the input rows its `row_deps` declares, then runs
//! `process`. Endpoints are the only place external memory is bound; the
//! source and sink callbacks fire once per line group so callers can stream
//! through ring windows of their own.

use std::sync::Arc;

use tracing::debug;
use vfc_core::numeric::{checked_add, checked_mul, ceil_n};
use vfc_core::{
    Filter, LineBuffer, PlaneDescriptor, ALIGNMENT, BUFFER_MAX, MAX_PLANES,
};

use crate::error::{GraphError, GraphResult};
use crate::ImageBuffer;

/// Identifier of a graph node.
pub type NodeId = usize;

/// Per-line-group callback: `(line, left, right) -> code`; non-zero aborts.
pub type Callback<'a> = Option<&'a mut dyn FnMut(u32, u32, u32) -> i32>;

enum NodeKind {
    Source,
    Transform {
        filter: Arc<dyn Filter>,
        deps: Vec<(NodeId, usize)>,
    },
}

struct Node {
    kind: NodeKind,
    planes: Vec<PlaneDescriptor>,
    // Compiled state.
    cache: Vec<u32>,
    mask: u32,
    ring_offsets: Vec<usize>,
    strides: Vec<isize>,
    ctx_offset: usize,
    ctx_size: usize,
    sink_binding: Vec<Option<usize>>,
}

/// A compiled conversion pipeline over one image.
pub struct FilterGraph {
    nodes: Vec<Node>,
    sink_deps: Vec<(NodeId, usize)>,
    sink_ratio_h: Vec<u32>,
    sink_width: u32,
    sink_height: u32,
    sink_step: u32,
    src_ratio_h: Vec<u32>,
    src_width: u32,
    src_height: u32,
    src_step: u32,
    tmp_size: usize,
    scratch_offset: usize,
    scratch_size: usize,
    compiled: bool,
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("nodes", &self.nodes.len())
            .field("sink_width", &self.sink_width)
            .field("sink_height", &self.sink_height)
            .field("src_width", &self.src_width)
            .field("src_height", &self.src_height)
            .field("compiled", &self.compiled)
            .finish()
    }
}

struct SimState {
    // Source nodes advance one cursor per plane (plane rows differ under
    // subsampling); transforms produce all planes together and use slot 0.
    cursor: Vec<u32>,
    cache: Vec<u32>,
}

/// Dry-run production to find each node's live-row window.
///
/// Each request for rows `[first, last)` of a plane advances the producer's
/// cursor; the live window is the distance from the oldest row a consumer
/// still needs back from wherever production has reached.
fn simulate(nodes: &[Node], states: &mut [SimState], id: NodeId, plane: usize, first: u32, last: u32) {
    match &nodes[id].kind {
        NodeKind::Source => {
            let st = &mut states[id];
            st.cursor[plane] = st.cursor[plane].max(last);
            st.cache[plane] = st.cache[plane].max(st.cursor[plane].saturating_sub(first));
        }
        NodeKind::Transform { filter, deps } => {
            let step = filter.descriptor().step.max(1);
            let mut cursor = states[id].cursor[0];
            if cursor < last {
                while cursor < last {
                    let (top, bottom) = filter.row_deps(cursor);
                    for &(dep_id, dep_plane) in deps {
                        simulate(nodes, states, dep_id, dep_plane, top, bottom);
                    }
                    cursor += step;
                }
                states[id].cursor[0] = cursor;
            }
            let st = &mut states[id];
            st.cache[plane] = st.cache[plane].max(st.cursor[0].saturating_sub(first));
        }
    }
}

impl FilterGraph {
    /// Starts a graph with a source of the given plane shapes.
    ///
    /// `src_ratio_h[p]` is the number of luma lines per line of plane `p`
    /// (1, 2, or 4 for vertical subsampling).
    pub fn new(src_planes: &[PlaneDescriptor], src_ratio_h: &[u32]) -> GraphResult<Self> {
        if src_planes.is_empty() || src_planes.len() > MAX_PLANES {
            return Err(GraphError::InvalidArgument(format!(
                "source must have 1..={} planes, got {}",
                MAX_PLANES,
                src_planes.len()
            )));
        }
        if src_planes.len() != src_ratio_h.len() {
            return Err(GraphError::InvalidArgument(
                "per-plane subsampling ratios must match plane count".into(),
            ));
        }

        let num = src_planes.len();
        let source = Node {
            kind: NodeKind::Source,
            planes: src_planes.to_vec(),
            cache: vec![0; num],
            mask: BUFFER_MAX,
            ring_offsets: vec![0; num],
            strides: vec![0; num],
            ctx_offset: 0,
            ctx_size: 0,
            sink_binding: vec![None; num],
        };

        Ok(Self {
            nodes: vec![source],
            sink_deps: Vec::new(),
            sink_ratio_h: Vec::new(),
            sink_width: 0,
            sink_height: 0,
            sink_step: 1,
            src_ratio_h: src_ratio_h.to_vec(),
            src_width: src_planes[0].width,
            src_height: src_planes[0].height,
            src_step: src_ratio_h.iter().copied().max().unwrap_or(1),
            tmp_size: 0,
            scratch_offset: 0,
            scratch_size: 0,
            compiled: false,
        })
    }

    /// The source node's id.
    pub fn source_id(&self) -> NodeId {
        0
    }

    /// Adds a transform node consuming the given `(node, plane)` deps.
    pub fn add_transform(
        &mut self,
        filter: Arc<dyn Filter>,
        deps: &[(NodeId, usize)],
    ) -> GraphResult<NodeId> {
        if self.compiled {
            return Err(GraphError::InvalidArgument(
                "graph is closed; no further mutation is allowed".into(),
            ));
        }

        let desc = *filter.descriptor();
        if desc.num_deps == 0 || deps.len() != desc.num_deps as usize {
            return Err(GraphError::InvalidArgument(format!(
                "filter declares {} deps, {} supplied",
                desc.num_deps,
                deps.len()
            )));
        }

        // All dep planes must exist and share one shape; the filter's
        // declared reach must fit inside it.
        let mut dep_desc: Option<PlaneDescriptor> = None;
        for &(id, plane) in deps {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| GraphError::InvalidArgument(format!("unknown node {}", id)))?;
            let pd = *node.planes.get(plane).ok_or_else(|| {
                GraphError::InvalidArgument(format!("node {} has no plane {}", id, plane))
            })?;
            match dep_desc {
                None => dep_desc = Some(pd),
                Some(prev) if prev != pd => {
                    return Err(GraphError::InvalidArgument(
                        "input planes of one filter must share a descriptor".into(),
                    ))
                }
                _ => {}
            }
        }
        let dep_desc = dep_desc.expect("num_deps >= 1");

        let (_, col_hi) = filter.col_deps(0, desc.format.width);
        if col_hi > dep_desc.width {
            return Err(GraphError::InvalidArgument(format!(
                "filter reads {} input columns but the dep plane has {}",
                col_hi, dep_desc.width
            )));
        }
        let mut row_hi = 0u32;
        let mut i = 0u32;
        while i < desc.format.height {
            row_hi = row_hi.max(filter.row_deps(i).1);
            i += desc.step.max(1);
        }
        if row_hi > dep_desc.height {
            return Err(GraphError::InvalidArgument(format!(
                "filter reads {} input rows but the dep plane has {}",
                row_hi, dep_desc.height
            )));
        }

        let num = desc.num_planes as usize;
        self.nodes.push(Node {
            kind: NodeKind::Transform {
                filter,
                deps: deps.to_vec(),
            },
            planes: vec![desc.format; num],
            cache: vec![0; num],
            mask: BUFFER_MAX,
            ring_offsets: vec![0; num],
            strides: vec![0; num],
            ctx_offset: 0,
            ctx_size: desc.context_size,
            sink_binding: vec![None; num],
        });
        Ok(self.nodes.len() - 1)
    }

    /// Closes the graph with a sink consuming the given deps, and compiles
    /// buffering.
    ///
    /// `sink_ratio_h[p]` is the number of sink luma lines per line of sink
    /// plane `p`.
    pub fn set_sink(
        &mut self,
        deps: &[(NodeId, usize)],
        sink_ratio_h: &[u32],
    ) -> GraphResult<()> {
        if self.compiled {
            return Err(GraphError::InvalidArgument("sink already set".into()));
        }
        if deps.is_empty() || deps.len() > MAX_PLANES || deps.len() != sink_ratio_h.len() {
            return Err(GraphError::InvalidArgument(
                "sink must have 1..=4 deps with matching ratios".into(),
            ));
        }
        for &(id, plane) in deps {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| GraphError::InvalidArgument(format!("unknown node {}", id)))?;
            if plane >= node.planes.len() {
                return Err(GraphError::InvalidArgument(format!(
                    "node {} has no plane {}",
                    id, plane
                )));
            }
            if matches!(node.kind, NodeKind::Source) {
                return Err(GraphError::InvalidArgument(
                    "sink cannot consume the source directly; insert a copy".into(),
                ));
            }
        }

        self.sink_deps = deps.to_vec();
        self.sink_ratio_h = sink_ratio_h.to_vec();
        self.sink_width = self.nodes[deps[0].0].planes[deps[0].1].width;
        self.sink_height = self.nodes[deps[0].0].planes[deps[0].1].height;
        self.sink_step = sink_ratio_h.iter().copied().max().unwrap_or(1);

        self.compile()?;
        self.compiled = true;
        Ok(())
    }

    fn compile(&mut self) -> GraphResult<()> {
        let mut states: Vec<SimState> = self
            .nodes
            .iter()
            .map(|n| SimState {
                cursor: vec![0; n.planes.len()],
                cache: vec![0; n.planes.len()],
            })
            .collect();

        let mut i = 0u32;
        while i < self.sink_height {
            for (p, &(id, plane)) in self.sink_deps.iter().enumerate() {
                let sub = self.sink_ratio_h[p];
                let first = i / sub;
                let last = ((i + self.sink_step).min(self.sink_height)).div_ceil(sub);
                simulate(&self.nodes, &mut states, id, plane, first, last);
            }
            i += self.sink_step;
        }

        for (node, st) in self.nodes.iter_mut().zip(states.iter()) {
            node.cache = st.cache.clone();
        }

        // Whole-plane filters collapse their rings and their inputs'.
        let plane_forced: Vec<bool> = self
            .nodes
            .iter()
            .map(|n| match &n.kind {
                NodeKind::Transform { filter, .. } => filter.descriptor().flags.entire_plane,
                NodeKind::Source => false,
            })
            .collect();
        for id in 0..self.nodes.len() {
            if plane_forced[id] {
                let deps: Vec<(NodeId, usize)> = match &self.nodes[id].kind {
                    NodeKind::Transform { deps, .. } => deps.clone(),
                    NodeKind::Source => Vec::new(),
                };
                for (plane, h) in (0..self.nodes[id].planes.len())
                    .map(|p| (p, self.nodes[id].planes[p].height))
                    .collect::<Vec<_>>()
                {
                    self.nodes[id].cache[plane] = h;
                }
                for (dep_id, dep_plane) in deps {
                    let h = self.nodes[dep_id].planes[dep_plane].height;
                    self.nodes[dep_id].cache[dep_plane] = h;
                }
            }
        }

        // Record sink bindings so final nodes write straight into the
        // caller's destination buffer.
        let sink_deps = self.sink_deps.clone();
        for (sink_plane, (id, plane)) in sink_deps.into_iter().enumerate() {
            self.nodes[id].sink_binding[plane] = Some(sink_plane);
        }

        // Ring masks and tmp layout.
        let mut offset = 0usize;
        for id in 1..self.nodes.len() {
            let max_cache = *self.nodes[id].cache.iter().max().unwrap_or(&0);
            let height = self.nodes[id].planes[0].height;
            self.nodes[id].mask = if max_cache >= height {
                BUFFER_MAX
            } else {
                vfc_core::select_buffer_mask(max_cache)
            };

            for plane in 0..self.nodes[id].planes.len() {
                if self.nodes[id].sink_binding[plane].is_some() {
                    continue;
                }
                let pd = self.nodes[id].planes[plane];
                let stride = ceil_n(
                    checked_mul(pd.width as usize, pd.bytes_per_sample as usize)?,
                    ALIGNMENT,
                );
                let rows = if self.nodes[id].mask == BUFFER_MAX {
                    pd.height as usize
                } else {
                    self.nodes[id].mask as usize + 1
                };
                self.nodes[id].ring_offsets[plane] = offset;
                self.nodes[id].strides[plane] = stride as isize;
                offset = checked_add(offset, checked_mul(stride, rows)?)?;
            }
        }

        // Filter contexts.
        for id in 1..self.nodes.len() {
            let size = ceil_n(self.nodes[id].ctx_size, ALIGNMENT);
            self.nodes[id].ctx_offset = offset;
            self.nodes[id].ctx_size = size;
            offset = checked_add(offset, size)?;
        }

        // Shared scratchpad.
        self.scratch_offset = offset;
        self.scratch_size = self
            .nodes
            .iter()
            .map(|n| match &n.kind {
                NodeKind::Transform { filter, .. } => {
                    ceil_n(filter.descriptor().scratchpad_size, ALIGNMENT)
                }
                NodeKind::Source => 0,
            })
            .max()
            .unwrap_or(0);
        self.tmp_size = checked_add(offset, self.scratch_size)?;

        debug!(
            nodes = self.nodes.len(),
            tmp_size = self.tmp_size,
            input_buffering = self.get_input_buffering(),
            output_buffering = self.get_output_buffering(),
            "compiled filter graph"
        );
        Ok(())
    }

    /// Bytes of engine-owned temporary memory required by
    /// [`process`](Self::process).
    pub fn get_tmp_size(&self) -> usize {
        self.tmp_size
    }

    /// Ring window required of the source buffer, in luma lines.
    pub fn get_input_buffering(&self) -> u32 {
        self.nodes[0]
            .cache
            .iter()
            .zip(self.src_ratio_h.iter())
            .map(|(&c, &r)| c.saturating_mul(r))
            .max()
            .unwrap_or(0)
            .max(self.src_step)
    }

    /// Ring window required of the sink buffer, in luma lines.
    pub fn get_output_buffering(&self) -> u32 {
        self.sink_deps
            .iter()
            .zip(self.sink_ratio_h.iter())
            .map(|(&(id, plane), &r)| self.nodes[id].cache[plane].saturating_mul(r))
            .max()
            .unwrap_or(0)
            .max(self.sink_step)
    }

    fn check_window(supplied_mask: u32, required: u32, height: u32) -> GraphResult<()> {
        if supplied_mask == BUFFER_MAX {
            return Ok(());
        }
        let supplied = supplied_mask + 1;
        if supplied < required.min(height) {
            return Err(GraphError::InsufficientBuffering { supplied, required });
        }
        Ok(())
    }

    /// Runs the graph, streaming the source to the sink.
    ///
    /// `tmp` must be at least [`get_tmp_size`](Self::get_tmp_size) bytes and
    /// 64-byte aligned. `unpack` fires before the engine reads each group of
    /// source luma lines; `pack` fires after each group of sink luma lines
    /// is complete. Either callback may abort the run by returning non-zero.
    pub fn process(
        &self,
        src: &ImageBuffer,
        dst: &ImageBuffer,
        tmp: &mut [u8],
        mut unpack: Callback<'_>,
        mut pack: Callback<'_>,
    ) -> GraphResult<()> {
        if !self.compiled {
            return Err(GraphError::InvalidArgument("graph has no sink".into()));
        }
        if tmp.len() < self.tmp_size {
            return Err(GraphError::Resource(format!(
                "tmp buffer of {} bytes is less than the required {}",
                tmp.len(),
                self.tmp_size
            )));
        }
        if self.tmp_size > 0 && tmp.as_ptr() as usize % ALIGNMENT != 0 {
            return Err(GraphError::Resource(
                "tmp buffer must be 64-byte aligned".into(),
            ));
        }

        // Caller ring windows must cover the compiled requirements.
        for (plane, &cache) in self.nodes[0].cache.iter().enumerate() {
            Self::check_window(
                src.planes[plane].mask(),
                cache,
                self.nodes[0].planes[plane].height,
            )?;
        }
        for (sink_plane, &(id, plane)) in self.sink_deps.iter().enumerate() {
            Self::check_window(
                dst.planes[sink_plane].mask(),
                self.nodes[id].cache[plane],
                self.nodes[id].planes[plane].height,
            )?;
        }

        // Materialize every node's plane views once.
        let tmp_ptr = tmp.as_mut_ptr();
        let buffers: Vec<[LineBuffer; MAX_PLANES]> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(id, node)| {
                let mut out = [LineBuffer::empty(); MAX_PLANES];
                for plane in 0..node.planes.len() {
                    out[plane] = if id == 0 {
                        src.planes[plane]
                    } else if let Some(sp) = node.sink_binding[plane] {
                        dst.planes[sp]
                    } else {
                        LineBuffer::new(
                            unsafe { tmp_ptr.add(node.ring_offsets[plane]) },
                            node.strides[plane],
                            node.mask,
                        )
                    };
                }
                out
            })
            .collect();

        // Zero and initialize per-run filter contexts.
        for node in &self.nodes[1..] {
            if node.ctx_size > 0 {
                let ctx = unsafe {
                    std::slice::from_raw_parts_mut(tmp_ptr.add(node.ctx_offset), node.ctx_size)
                };
                ctx.fill(0);
                if let NodeKind::Transform { filter, .. } = &node.kind {
                    filter.init_context(ctx);
                }
            }
        }

        let mut exec = Exec {
            cursors: vec![0u32; self.nodes.len()],
            tmp_ptr,
            scratch_offset: self.scratch_offset,
            scratch_size: self.scratch_size,
            unpack: unpack.take(),
            buffers,
        };

        let mut i = 0u32;
        while i < self.sink_height {
            for (p, &(id, _plane)) in self.sink_deps.iter().enumerate() {
                let sub = self.sink_ratio_h[p];
                let last = ((i + self.sink_step).min(self.sink_height)).div_ceil(sub);
                self.generate(&mut exec, id, last)?;
            }
            if let Some(cb) = pack.as_mut() {
                let code = cb(i, 0, self.sink_width);
                if code != 0 {
                    return Err(GraphError::Callback(code));
                }
            }
            i += self.sink_step;
        }
        Ok(())
    }

    /// Ensures `node` has produced rows `[0, needed)`.
    fn generate(&self, exec: &mut Exec<'_>, id: NodeId, needed: u32) -> GraphResult<()> {
        match &self.nodes[id].kind {
            NodeKind::Source => {
                // Source cursors run in luma lines; `needed` arrives in the
                // consumer plane's rows and was scaled by the caller.
                while exec.cursors[id] < needed {
                    let cursor = exec.cursors[id];
                    if let Some(cb) = exec.unpack.as_mut() {
                        let code = cb(cursor, 0, self.src_width);
                        if code != 0 {
                            return Err(GraphError::Callback(code));
                        }
                    }
                    exec.cursors[id] = (cursor + self.src_step).min(self.src_height);
                    if exec.cursors[id] == cursor {
                        break;
                    }
                }
                Ok(())
            }
            NodeKind::Transform { filter, deps } => {
                let desc = filter.descriptor();
                let step = desc.step.max(1);

                while exec.cursors[id] < needed {
                    let cursor = exec.cursors[id];
                    let (_, bottom) = filter.row_deps(cursor);

                    for &(dep_id, dep_plane) in deps {
                        let dep_needed = if dep_id == 0 {
                            // Scale to source luma lines.
                            bottom
                                .saturating_mul(self.src_ratio_h[dep_plane])
                                .min(self.src_height)
                        } else {
                            bottom
                        };
                        self.generate(exec, dep_id, dep_needed)?;
                    }

                    let mut dep_bufs = [LineBuffer::empty(); MAX_PLANES];
                    for (k, &(dep_id, dep_plane)) in deps.iter().enumerate() {
                        dep_bufs[k] = exec.buffers[dep_id][dep_plane];
                    }
                    let out_bufs = exec.buffers[id];

                    let node = &self.nodes[id];
                    let (ctx, scratch) = unsafe {
                        (
                            std::slice::from_raw_parts_mut(
                                exec.tmp_ptr.add(node.ctx_offset),
                                node.ctx_size,
                            ),
                            std::slice::from_raw_parts_mut(
                                exec.tmp_ptr.add(exec.scratch_offset),
                                exec.scratch_size,
                            ),
                        )
                    };

                    filter.process(
                        &dep_bufs[..desc.num_deps as usize],
                        &out_bufs[..desc.num_planes as usize],
                        cursor,
                        0,
                        desc.format.width,
                        ctx,
                        scratch,
                    );
                    exec.cursors[id] = cursor + step;
                }
                Ok(())
            }
        }
    }
}

struct Exec<'a> {
    cursors: Vec<u32>,
    tmp_ptr: *mut u8,
    scratch_offset: usize,
    scratch_size: usize,
    unpack: Callback<'a>,
    buffers: Vec<[LineBuffer; MAX_PLANES]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::CopyFilter;
    use vfc_core::{AlignedVec, CpuClass, PixelType};
    use vfc_resize::{compute_filter, FilterType, ResizeFilterV};

    fn plane_desc(width: u32, height: u32, bytes: u32) -> PlaneDescriptor {
        PlaneDescriptor::new(width, height, bytes)
    }

    fn v_resize_graph(src_h: u32, dst_h: u32, width: u32) -> FilterGraph {
        let ctx = Arc::new(
            compute_filter(FilterType::Bilinear, src_h, dst_h, 0.0, src_h as f64).unwrap(),
        );
        let filt = Arc::new(ResizeFilterV::new(
            ctx,
            PixelType::F32,
            32,
            width,
            CpuClass::None,
        ));

        let mut graph =
            FilterGraph::new(&[plane_desc(width, src_h, 4)], &[1]).unwrap();
        let node = graph.add_transform(filt, &[(0, 0)]).unwrap();
        graph.set_sink(&[(node, 0)], &[1]).unwrap();
        graph
    }

    #[test]
    fn test_copy_graph_is_identity() {
        let mut graph = FilterGraph::new(&[plane_desc(16, 8, 1)], &[1]).unwrap();
        let node = graph
            .add_transform(Arc::new(CopyFilter::new(16, 8, 1)), &[(0, 0)])
            .unwrap();
        graph.set_sink(&[(node, 0)], &[1]).unwrap();

        let mut src_data: AlignedVec<u8> = AlignedVec::zeroed(16 * 8);
        for (i, x) in src_data.as_mut_slice().iter_mut().enumerate() {
            *x = i as u8;
        }
        let mut dst_data: AlignedVec<u8> = AlignedVec::zeroed(16 * 8);
        let mut tmp: AlignedVec<u8> = AlignedVec::zeroed(graph.get_tmp_size());

        let mut src = ImageBuffer::new();
        src.set_plane(0, src_data.as_mut_ptr(), 16);
        let mut dst = ImageBuffer::new();
        dst.set_plane(0, dst_data.as_mut_ptr(), 16);

        graph
            .process(&src, &dst, tmp.as_mut_slice(), None, None)
            .unwrap();
        assert_eq!(src_data.as_slice(), dst_data.as_slice());
    }

    #[test]
    fn test_bilinear_vertical_needs_two_lines() {
        let graph = v_resize_graph(32, 64, 16);
        assert_eq!(graph.get_input_buffering(), 2);
    }

    #[test]
    fn test_ring_window_suffices_and_small_window_rejected() {
        let width = 16usize;
        let graph = v_resize_graph(32, 64, width as u32);

        // Full source image the unpack callback streams from.
        let full: Vec<f32> = (0..32 * width).map(|i| (i / width) as f32).collect();

        // 4-line ring (mask 3) stays above the required 2-line window.
        let mut ring: AlignedVec<f32> = AlignedVec::zeroed(4 * width);
        let ring_ptr = ring.as_mut_ptr();
        let stride = (width * 4) as isize;

        let mut src = ImageBuffer::new();
        src.set_plane_window(0, ring_ptr as *mut u8, stride, 3);

        let mut dst_data: AlignedVec<f32> = AlignedVec::zeroed(64 * width);
        let mut dst = ImageBuffer::new();
        dst.set_plane(0, dst_data.as_mut_ptr() as *mut u8, stride);

        let mut tmp: AlignedVec<u8> = AlignedVec::zeroed(graph.get_tmp_size());

        let full_ref = &full;
        let mut unpack = |i: u32, _l: u32, _r: u32| -> i32 {
            let row = &full_ref[i as usize * width..(i as usize + 1) * width];
            unsafe {
                std::ptr::copy_nonoverlapping(
                    row.as_ptr(),
                    ring_ptr.add((i & 3) as usize * width),
                    width,
                );
            }
            0
        };

        graph
            .process(
                &src,
                &dst,
                tmp.as_mut_slice(),
                Some(&mut unpack),
                None,
            )
            .unwrap();

        // Interior rows interpolate between consecutive source rows, so the
        // output is monotone in the row index.
        let col0: Vec<f32> = (0..64).map(|r| dst_data[r * width]).collect();
        for w in col0.windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert_eq!(col0[0], 0.0);
        assert!((col0[63] - 31.0).abs() < 1e-5);

        // A 1-line ring is below the 2-line requirement.
        let mut tiny = ImageBuffer::new();
        tiny.set_plane_window(0, ring_ptr as *mut u8, stride, 0);
        let err = graph
            .process(&tiny, &dst, tmp.as_mut_slice(), None, None)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::InsufficientBuffering {
                supplied: 1,
                required: 2
            }
        ));
    }

    #[test]
    fn test_callback_abort_propagates() {
        let mut graph = FilterGraph::new(&[plane_desc(8, 4, 1)], &[1]).unwrap();
        let node = graph
            .add_transform(Arc::new(CopyFilter::new(8, 4, 1)), &[(0, 0)])
            .unwrap();
        graph.set_sink(&[(node, 0)], &[1]).unwrap();

        let mut src_data: AlignedVec<u8> = AlignedVec::zeroed(8 * 4);
        let mut dst_data: AlignedVec<u8> = AlignedVec::zeroed(8 * 4);
        let mut tmp: AlignedVec<u8> = AlignedVec::zeroed(graph.get_tmp_size());

        let mut src = ImageBuffer::new();
        src.set_plane(0, src_data.as_mut_ptr(), 8);
        let mut dst = ImageBuffer::new();
        dst.set_plane(0, dst_data.as_mut_ptr(), 8);

        let mut pack = |i: u32, _l: u32, _r: u32| -> i32 {
            if i >= 2 {
                7
            } else {
                0
            }
        };
        let err = graph
            .process(&src, &dst, tmp.as_mut_slice(), None, Some(&mut pack))
            .unwrap_err();
        assert!(matches!(err, GraphError::Callback(7)));
    }

    #[test]
    fn test_mutation_after_sink_rejected() {
        let mut graph = FilterGraph::new(&[plane_desc(8, 4, 1)], &[1]).unwrap();
        let node = graph
            .add_transform(Arc::new(CopyFilter::new(8, 4, 1)), &[(0, 0)])
            .unwrap();
        graph.set_sink(&[(node, 0)], &[1]).unwrap();
        assert!(graph
            .add_transform(Arc::new(CopyFilter::new(8, 4, 1)), &[(node, 0)])
            .is_err());
    }

    #[test]
    fn test_sink_cannot_alias_source() {
        let mut graph = FilterGraph::new(&[plane_desc(8, 4, 1)], &[1]).unwrap();
        assert!(graph.set_sink(&[(0, 0)], &[1]).is_err());
    }

    #[test]
    fn test_mismatched_dep_shape_rejected() {
        let mut graph = FilterGraph::new(&[plane_desc(8, 4, 1)], &[1]).unwrap();
        // A copy filter of the wrong width reads past the dep plane.
        assert!(graph
            .add_transform(Arc::new(CopyFilter::new(16, 4, 1)), &[(0, 0)])
            .is_err());
    }
}
