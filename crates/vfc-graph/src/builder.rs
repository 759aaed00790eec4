//! Graph builder: from a format pair to a minimal transform sequence.
//!
//! Given a source and target [`ImageFormat`], emit the shortest pipeline
//! honoring plane count, subsampling, range, chroma siting, and field
//! parity:
//!
//! 1. convert integer planes to working float when a colorspace change
//!    needs it (or to a 16-bit container when only resampling does)
//! 2. resample chroma up to luma resolution
//! 3. convert to RGB if primaries or transfer must change
//! 4. resize to the target luma size
//! 5. convert colorspace to the target
//! 6. resample chroma back to the target subsampling
//! 7. convert to the target pixel format, dithering integer targets
//!
//! Steps that would be no-ops are skipped; a plane nothing touches gets a
//! copy node so the sink never aliases the source.

use std::sync::Arc;

use tracing::debug;
use vfc_color::{ColorspaceConversion, ColorspaceDefinition, PlanParams};
use vfc_core::{
    CpuClass, DitherType, Filter, FieldParity, ImageFormat, MatrixCoefficients, PixelFormat,
    PixelType, PlaneDescriptor,
};
use vfc_depth::DepthConversion;
use vfc_resize::{FilterType, ResizeConversion};

use crate::copy::CopyFilter;
use crate::error::{GraphError, GraphResult};
use crate::graph::{FilterGraph, NodeId};

/// Parameters of [`build_filter_graph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilderParams {
    /// Resampling filter for luma and RGB planes.
    pub filter: FilterType,
    /// Resampling filter for chroma planes.
    pub filter_uv: FilterType,
    /// Dithering for conversions to integer formats.
    pub dither_type: DitherType,
    /// Luminance of linear 1.0 in cd/m2.
    pub nominal_peak_luminance: f64,
    /// Allow polynomial / tabulated gamma evaluation.
    pub allow_approximate_gamma: bool,
    /// Use scene-referred curves where the standard defines both.
    pub scene_referred: bool,
    /// Sub-pixel shift of the source window, in luma samples.
    pub shift_w: f64,
    /// Vertical sub-pixel shift, in luma lines.
    pub shift_h: f64,
    /// Active source width in luma samples; defaults to the full width.
    pub subwidth: Option<f64>,
    /// Active source height in luma lines; defaults to the full height.
    pub subheight: Option<f64>,
    /// CPU class for kernel selection.
    pub cpu: CpuClass,
}

impl Default for GraphBuilderParams {
    fn default() -> Self {
        Self {
            filter: FilterType::default(),
            filter_uv: FilterType::Bilinear,
            dither_type: DitherType::None,
            nominal_peak_luminance: 100.0,
            allow_approximate_gamma: false,
            scene_referred: false,
            shift_w: 0.0,
            shift_h: 0.0,
            subwidth: None,
            subheight: None,
            cpu: CpuClass::Auto,
        }
    }
}

/// State of one plane's chain while the pipeline is being emitted.
#[derive(Debug, Clone, Copy)]
struct Chain {
    node: NodeId,
    plane: usize,
    width: u32,
    height: u32,
    format: PixelFormat,
}

struct Builder<'a> {
    graph: FilterGraph,
    params: &'a GraphBuilderParams,
}

/// Field-parity phase offset in chroma rows.
fn parity_offset(parity: FieldParity, subsample_h: u32) -> f64 {
    if subsample_h == 0 {
        return 0.0;
    }
    match parity {
        FieldParity::Progressive => 0.0,
        FieldParity::Top => -0.25,
        FieldParity::Bottom => 0.25,
    }
}

/// Resampler shift aligning a source sample grid with siting offset
/// `o_src` to a destination grid with siting offset `o_dst`, plus a user
/// shift given in source-grid samples.
fn grid_shift(o_src: f64, o_dst: f64, src_dim: u32, dst_dim: u32, user_shift: f64) -> f64 {
    o_dst * (src_dim as f64 / dst_dim as f64) - o_src + user_shift
}

impl<'a> Builder<'a> {
    fn attach(&mut self, chain: &mut Chain, filter: Arc<dyn Filter>) -> GraphResult<()> {
        let desc = *filter.descriptor();
        let node = self
            .graph
            .add_transform(filter, &[(chain.node, chain.plane)])?;
        chain.node = node;
        chain.plane = 0;
        chain.width = desc.format.width;
        chain.height = desc.format.height;
        Ok(())
    }

    /// Converts a chain to the given pixel format, preserving its
    /// range/chroma metadata.
    fn depth(&mut self, chain: &mut Chain, target: PixelFormat, dither: DitherType) -> GraphResult<()> {
        let filt = DepthConversion::new(chain.format, target, chain.width, chain.height)
            .dither(dither)
            .cpu(self.params.cpu)
            .create()?;
        if let Some(filt) = filt {
            self.attach(chain, filt)?;
        }
        chain.format = target;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn resize(
        &mut self,
        chain: &mut Chain,
        dst_w: u32,
        dst_h: u32,
        filter: FilterType,
        shift_w: f64,
        shift_h: f64,
        subwidth: f64,
        subheight: f64,
    ) -> GraphResult<()> {
        let filters = ResizeConversion::new(
            chain.format.pixel_type,
            chain.format.depth,
            chain.width,
            chain.height,
            dst_w,
            dst_h,
        )
        .filter(filter)
        .shift(shift_w, shift_h)
        .active_region(subwidth, subheight)
        .cpu(self.params.cpu)
        .create()?;

        for filt in filters {
            self.attach(chain, filt)?;
        }
        chain.width = dst_w;
        chain.height = dst_h;
        Ok(())
    }

    /// Applies one colorspace conversion across the three color chains.
    fn colorspace(
        &mut self,
        chains: &mut [Chain; 3],
        input: ColorspaceDefinition,
        output: ColorspaceDefinition,
    ) -> GraphResult<()> {
        let filt = ColorspaceConversion::new(
            input,
            output,
            chains[0].width,
            chains[0].height,
        )
        .params(PlanParams {
            peak_luminance: self.params.nominal_peak_luminance,
            approximate_gamma: self.params.allow_approximate_gamma,
            scene_referred: self.params.scene_referred,
        })
        .cpu(self.params.cpu)
        .create()?;

        let Some(filt) = filt else { return Ok(()) };

        let deps: Vec<(NodeId, usize)> =
            chains.iter().map(|c| (c.node, c.plane)).collect();
        let node = self.graph.add_transform(filt, &deps)?;
        for (p, chain) in chains.iter_mut().enumerate() {
            chain.node = node;
            chain.plane = p;
        }
        Ok(())
    }
}

/// Builds the conversion graph for a format pair.
pub fn build_filter_graph(
    src: &ImageFormat,
    dst: &ImageFormat,
    params: &GraphBuilderParams,
) -> GraphResult<FilterGraph> {
    src.validate()?;
    dst.validate()?;

    let color_planes = src.color_family.num_planes();
    if color_planes != dst.color_family.num_planes() {
        return Err(GraphError::Unsupported(format!(
            "cannot convert between {:?} and {:?}",
            src.color_family, dst.color_family
        )));
    }
    if (src.alpha == vfc_core::AlphaType::None) != (dst.alpha == vfc_core::AlphaType::None) {
        return Err(GraphError::Unsupported(
            "alpha plane must be present on both sides or neither".into(),
        ));
    }

    let src_csp = ColorspaceDefinition {
        matrix: src.matrix,
        transfer: src.transfer,
        primaries: src.primaries,
    };
    let dst_csp = ColorspaceDefinition {
        matrix: dst.matrix,
        transfer: dst.transfer,
        primaries: dst.primaries,
    };
    let needs_colorspace = color_planes == 3 && src_csp != dst_csp;

    let subwidth = params.subwidth.unwrap_or(src.width as f64);
    let subheight = params.subheight.unwrap_or(src.height as f64);
    let needs_luma_resize = src.width != dst.width
        || src.height != dst.height
        || params.shift_w != 0.0
        || params.shift_h != 0.0
        || subwidth != src.width as f64
        || subheight != src.height as f64;

    // Source node.
    let num_planes = src.num_planes();
    let mut planes = Vec::new();
    let mut src_ratio = Vec::new();
    for p in 0..num_planes {
        planes.push(PlaneDescriptor::new(
            src.plane_width(p),
            src.plane_height(p),
            src.pixel_type.size_of() as u32,
        ));
        src_ratio.push(if src.is_chroma_plane(p) {
            1 << src.subsample_h
        } else {
            1
        });
    }

    let mut builder = Builder {
        graph: FilterGraph::new(&planes, &src_ratio)?,
        params,
    };

    let source = builder.graph.source_id();
    let mut chains: Vec<Chain> = (0..num_planes as usize)
        .map(|p| Chain {
            node: source,
            plane: p,
            width: src.plane_width(p as u32),
            height: src.plane_height(p as u32),
            format: src.pixel_format(p as u32),
        })
        .collect();

    // Chroma siting phases on each side, in chroma samples.
    let src_o_w = src.chroma_location.offset_w(src.subsample_w);
    let src_o_h = src.chroma_location.offset_h(src.subsample_h)
        + parity_offset(src.field_parity, src.subsample_h);
    let dst_o_w = dst.chroma_location.offset_w(dst.subsample_w);
    let dst_o_h = dst.chroma_location.offset_h(dst.subsample_h)
        + parity_offset(dst.field_parity, dst.subsample_h);

    if needs_colorspace {
        // Work in float at 4:4:4.
        for chain in chains.iter_mut().take(3) {
            let target = PixelFormat {
                pixel_type: PixelType::F32,
                depth: 32,
                ..chain.format
            };
            builder.depth(chain, target, DitherType::None)?;
        }

        // Chroma up to luma resolution; the 4:4:4 grid has zero offset.
        for chain in chains.iter_mut().take(3).skip(1) {
            let up_shift_w = grid_shift(src_o_w, 0.0, chain.width, src.width, 0.0);
            let up_shift_h = grid_shift(src_o_h, 0.0, chain.height, src.height, 0.0);
            builder.resize(
                chain,
                src.width,
                src.height,
                params.filter_uv,
                up_shift_w,
                up_shift_h,
                chain.width as f64,
                chain.height as f64,
            )?;
            // The samples stop being chroma-centered once in RGB, but the
            // normalization metadata rides along until the final pack.
        }

        // To RGB in the source colorimetry before resizing.
        let mid_csp = ColorspaceDefinition {
            matrix: MatrixCoefficients::Rgb,
            transfer: src.transfer,
            primaries: src.primaries,
        };
        {
            let mut color: [Chain; 3] = [chains[0], chains[1], chains[2]];
            builder.colorspace(&mut color, src_csp, mid_csp)?;
            chains[0] = color[0];
            chains[1] = color[1];
            chains[2] = color[2];
        }
        for chain in chains.iter_mut().take(3) {
            chain.format.chroma = false;
        }

        // Resize the RGB planes to the target luma size.
        if needs_luma_resize {
            for chain in chains.iter_mut().take(3) {
                builder.resize(
                    chain,
                    dst.width,
                    dst.height,
                    params.filter,
                    params.shift_w,
                    params.shift_h,
                    subwidth,
                    subheight,
                )?;
            }
        }

        // Finish the colorspace conversion at the target size.
        {
            let mut color: [Chain; 3] = [chains[0], chains[1], chains[2]];
            builder.colorspace(&mut color, mid_csp, dst_csp)?;
            chains[0] = color[0];
            chains[1] = color[1];
            chains[2] = color[2];
        }
        if dst.color_family == vfc_core::ColorFamily::Yuv {
            chains[1].format.chroma = true;
            chains[2].format.chroma = true;
        }

        // Chroma back down to the target subsampling.
        for (p, chain) in chains.iter_mut().enumerate().take(3).skip(1) {
            let cw = dst.plane_width(p as u32);
            let ch = dst.plane_height(p as u32);
            let down_shift_w = grid_shift(0.0, dst_o_w, chain.width, cw, 0.0);
            let down_shift_h = grid_shift(0.0, dst_o_h, chain.height, ch, 0.0);
            builder.resize(
                chain,
                cw,
                ch,
                params.filter_uv,
                down_shift_w,
                down_shift_h,
                chain.width as f64,
                chain.height as f64,
            )?;
        }
    } else {
        // No colorspace change: resample each plane in its own grid.
        let resample_type_needed = needs_luma_resize
            || src.subsample_w != dst.subsample_w
            || src.subsample_h != dst.subsample_h
            || ((src.subsample_w | src.subsample_h) != 0
                && (src_o_w != dst_o_w || src_o_h != dst_o_h));

        if resample_type_needed && src.pixel_type == PixelType::U8 {
            // Resampling kernels run on 16-bit containers; widen in place.
            for chain in chains.iter_mut().take(color_planes as usize) {
                let target = PixelFormat {
                    pixel_type: PixelType::U16,
                    ..chain.format
                };
                builder.depth(chain, target, DitherType::None)?;
            }
        }

        for (p, chain) in chains.iter_mut().enumerate().take(color_planes as usize) {
            let is_chroma = src.is_chroma_plane(p as u32);
            let target_w = dst.plane_width(p as u32);
            let target_h = dst.plane_height(p as u32);
            let (filter, shift_w, shift_h, subw, subh) = if is_chroma {
                let scale_w = 1u32 << src.subsample_w;
                let scale_h = 1u32 << src.subsample_h;
                (
                    params.filter_uv,
                    grid_shift(src_o_w, dst_o_w, chain.width, target_w, params.shift_w / scale_w as f64),
                    grid_shift(src_o_h, dst_o_h, chain.height, target_h, params.shift_h / scale_h as f64),
                    subwidth / scale_w as f64,
                    subheight / scale_h as f64,
                )
            } else {
                (
                    params.filter,
                    params.shift_w,
                    params.shift_h,
                    subwidth,
                    subheight,
                )
            };
            builder.resize(chain, target_w, target_h, filter, shift_w, shift_h, subw, subh)?;
        }
    }

    // Alpha rides along: resized like luma, never through colorspace.
    if src.alpha != vfc_core::AlphaType::None {
        let p = color_planes as usize;
        let alpha_working = if chains[0].format.pixel_type.is_float() {
            PixelFormat {
                pixel_type: PixelType::F32,
                depth: 32,
                fullrange: true,
                chroma: false,
            }
        } else {
            PixelFormat {
                fullrange: true,
                chroma: false,
                ..chains[0].format
            }
        };
        let src_alpha = PixelFormat {
            fullrange: true,
            chroma: false,
            ..src.pixel_format(0)
        };
        chains[p].format = src_alpha;
        builder.depth(&mut chains[p], alpha_working, DitherType::None)?;
        if needs_luma_resize {
            let mut chain = chains[p];
            builder.resize(
                &mut chain,
                dst.width,
                dst.height,
                params.filter,
                params.shift_w,
                params.shift_h,
                subwidth,
                subheight,
            )?;
            chains[p] = chain;
        }
    }

    // Final pack to the target format.
    for p in 0..dst.num_planes() as usize {
        let target = if dst.is_alpha_plane(p as u32) {
            PixelFormat {
                fullrange: true,
                chroma: false,
                ..dst.pixel_format(0)
            }
        } else {
            dst.pixel_format(p as u32)
        };
        let mut chain = chains[p];
        builder.depth(&mut chain, target, params.dither_type)?;
        chains[p] = chain;
    }

    // Planes nothing touched still need a node to feed the sink.
    for chain in chains.iter_mut() {
        if chain.node == source {
            let filt = Arc::new(CopyFilter::new(
                chain.width,
                chain.height,
                chain.format.pixel_type.size_of() as u32,
            ));
            let node = builder
                .graph
                .add_transform(filt, &[(chain.node, chain.plane)])?;
            chain.node = node;
            chain.plane = 0;
        }
    }

    let sink_deps: Vec<(NodeId, usize)> = chains.iter().map(|c| (c.node, c.plane)).collect();
    let sink_ratio: Vec<u32> = (0..dst.num_planes())
        .map(|p| {
            if dst.is_chroma_plane(p) {
                1 << dst.subsample_h
            } else {
                1
            }
        })
        .collect();
    builder.graph.set_sink(&sink_deps, &sink_ratio)?;

    debug!(
        src_width = src.width,
        src_height = src.height,
        dst_width = dst.width,
        dst_height = dst.height,
        needs_colorspace,
        tmp_size = builder.graph.get_tmp_size(),
        "built filter graph"
    );

    Ok(builder.graph)
}
