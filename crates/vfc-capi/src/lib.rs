//! C ABI for the VFC-RS frame conversion engine.
//!
//! Mirrors the Rust API with a flat, C-friendly surface:
//!
//! - plain structs ([`vfc_image_format`], [`vfc_graph_builder_params`],
//!   [`vfc_image_buffer`]) with integer-coded enums
//! - numeric status codes: 0 success, 1xx usage errors, 2xx resource
//!   errors, 3xx internal errors; user-callback codes propagate verbatim
//! - a per-thread last-error message readable with
//!   [`vfc_get_last_error`]
//!
//! Colorimetry enums use ITU-T H.273 code points, so callers can pass
//! container metadata through unchanged.
//!
//! # Safety
//!
//! All functions taking raw pointers require them to be valid for the
//! call; graph handles must come from [`vfc_filter_graph_build`] and be
//! freed exactly once with [`vfc_filter_graph_free`].

#![allow(non_camel_case_types)]

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_uint, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};

use vfc_core::{
    AlphaType, ChromaLocation, ColorFamily, ColorPrimaries, ColorRange, CpuClass, DitherType,
    FieldParity, LineBuffer, MatrixCoefficients, PixelType, TransferCharacteristics,
};
use vfc_graph::{build_filter_graph, FilterGraph, GraphBuilderParams, GraphError, ImageBuffer};
use vfc_resize::FilterType;

/// Success.
pub const VFC_ERROR_SUCCESS: c_int = 0;
/// Malformed argument.
pub const VFC_ERROR_INVALID_ARGUMENT: c_int = 100;
/// Enum field holds an unknown code.
pub const VFC_ERROR_INVALID_ENUM: c_int = 101;
/// The format pair has no conversion path.
pub const VFC_ERROR_UNSUPPORTED: c_int = 102;
/// Allocation or size-computation failure.
pub const VFC_ERROR_OUT_OF_MEMORY: c_int = 200;
/// A supplied buffer window is too small.
pub const VFC_ERROR_INSUFFICIENT_BUFFER: c_int = 201;
/// Invariant breakage inside the engine.
pub const VFC_ERROR_INTERNAL: c_int = 300;

/// Buffer mask meaning "the whole image".
pub const VFC_BUFFER_MAX: u32 = u32::MAX;

thread_local! {
    static LAST_ERROR: RefCell<(c_int, String)> = const { RefCell::new((0, String::new())) };
}

fn set_error(code: c_int, msg: impl Into<String>) -> c_int {
    LAST_ERROR.with(|e| *e.borrow_mut() = (code, msg.into()));
    code
}

fn clear_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = (0, String::new()));
}

fn graph_error_code(err: &GraphError) -> c_int {
    match err {
        GraphError::InvalidArgument(_) => VFC_ERROR_INVALID_ARGUMENT,
        GraphError::Unsupported(_) | GraphError::Color(_) | GraphError::Depth(_) => {
            VFC_ERROR_UNSUPPORTED
        }
        GraphError::Resource(_) => VFC_ERROR_OUT_OF_MEMORY,
        GraphError::InsufficientBuffering { .. } => VFC_ERROR_INSUFFICIENT_BUFFER,
        GraphError::Callback(code) => *code,
        GraphError::Core(_) | GraphError::Resize(_) => VFC_ERROR_INVALID_ARGUMENT,
    }
}

/// Image metadata; field meanings follow the Rust `ImageFormat`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct vfc_image_format {
    /// Luma width in pixels.
    pub width: c_uint,
    /// Luma height in pixels.
    pub height: c_uint,
    /// 0 = U8, 1 = U16, 2 = F16, 3 = F32.
    pub pixel_type: c_uint,
    /// Log2 horizontal chroma subsampling.
    pub subsample_w: c_uint,
    /// Log2 vertical chroma subsampling.
    pub subsample_h: c_uint,
    /// 0 = grey, 1 = RGB, 2 = YUV.
    pub color_family: c_uint,
    /// H.273 matrix coefficients code.
    pub matrix_coefficients: c_uint,
    /// H.273 transfer characteristics code.
    pub transfer_characteristics: c_uint,
    /// H.273 colour primaries code.
    pub color_primaries: c_uint,
    /// Meaningful bits per integer sample.
    pub depth: c_uint,
    /// 0 = limited (TV), 1 = full (PC).
    pub pixel_range: c_uint,
    /// 0 = progressive, 1 = top, 2 = bottom.
    pub field_parity: c_uint,
    /// 0 = left, 1 = center, 2 = top-left, 3 = top, 4 = bottom-left,
    /// 5 = bottom.
    pub chroma_location: c_uint,
    /// 0 = none, 1 = straight, 2 = premultiplied.
    pub alpha: c_uint,
}

/// Parameters of [`vfc_filter_graph_build`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct vfc_graph_builder_params {
    /// Luminance of linear 1.0 in cd/m2.
    pub nominal_peak_luminance: f64,
    /// Non-zero allows polynomial / tabulated gamma.
    pub allow_approximate_gamma: c_int,
    /// Non-zero selects scene-referred curves.
    pub scene_referred: c_int,
    /// 0 = point, 1 = bilinear, 2 = bicubic, 3 = spline16, 4 = spline36,
    /// 5 = lanczos; applied to luma planes.
    pub resample_filter: c_uint,
    /// Resampling filter for chroma planes; same coding.
    pub resample_filter_uv: c_uint,
    /// 0 = none, 1 = ordered, 2 = error diffusion.
    pub dither_type: c_uint,
    /// 0 = scalar only, 1 = auto, 2 = baseline, 3 = extended,
    /// 4 = 64-byte wide.
    pub cpu_type: c_uint,
}

/// Plane pointers for one endpoint; `mask = VFC_BUFFER_MAX` means the
/// buffer holds the whole image.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct vfc_image_buffer {
    /// Base pointer per plane.
    pub data: [*mut c_void; 4],
    /// Row stride in bytes per plane.
    pub stride: [isize; 4],
    /// Ring mask per plane.
    pub mask: [u32; 4],
}

/// Per-line-group callback; returning non-zero aborts the run and the
/// code becomes the process status.
pub type vfc_filter_graph_callback =
    Option<unsafe extern "C" fn(user: *mut c_void, i: c_uint, left: c_uint, right: c_uint) -> c_int>;

/// Opaque graph handle.
pub struct vfc_filter_graph {
    inner: FilterGraph,
}

fn decode_pixel_type(v: c_uint) -> Option<PixelType> {
    match v {
        0 => Some(PixelType::U8),
        1 => Some(PixelType::U16),
        2 => Some(PixelType::F16),
        3 => Some(PixelType::F32),
        _ => None,
    }
}

fn decode_color_family(v: c_uint) -> Option<ColorFamily> {
    match v {
        0 => Some(ColorFamily::Grey),
        1 => Some(ColorFamily::Rgb),
        2 => Some(ColorFamily::Yuv),
        _ => None,
    }
}

fn decode_matrix(v: c_uint) -> Option<MatrixCoefficients> {
    match v {
        0 => Some(MatrixCoefficients::Rgb),
        1 => Some(MatrixCoefficients::Bt709),
        2 => Some(MatrixCoefficients::Unspecified),
        4 => Some(MatrixCoefficients::Fcc),
        5 => Some(MatrixCoefficients::Bt470Bg),
        6 => Some(MatrixCoefficients::Smpte170m),
        7 => Some(MatrixCoefficients::Smpte240m),
        9 => Some(MatrixCoefficients::Bt2020Ncl),
        _ => None,
    }
}

fn decode_transfer(v: c_uint) -> Option<TransferCharacteristics> {
    match v {
        1 | 6 => Some(TransferCharacteristics::Bt709),
        2 => Some(TransferCharacteristics::Unspecified),
        4 => Some(TransferCharacteristics::Bt470M),
        8 => Some(TransferCharacteristics::Linear),
        13 => Some(TransferCharacteristics::Srgb),
        16 => Some(TransferCharacteristics::St2084),
        18 => Some(TransferCharacteristics::AribB67),
        _ => None,
    }
}

fn decode_primaries(v: c_uint) -> Option<ColorPrimaries> {
    match v {
        1 => Some(ColorPrimaries::Bt709),
        2 => Some(ColorPrimaries::Unspecified),
        4 => Some(ColorPrimaries::Bt470M),
        5 => Some(ColorPrimaries::Bt470Bg),
        6 => Some(ColorPrimaries::Smpte170m),
        9 => Some(ColorPrimaries::Bt2020),
        12 => Some(ColorPrimaries::DciP3D65),
        _ => None,
    }
}

fn decode_filter(v: c_uint) -> Option<FilterType> {
    match v {
        0 => Some(FilterType::Point),
        1 => Some(FilterType::Bilinear),
        2 => Some(FilterType::default()),
        3 => Some(FilterType::Spline16),
        4 => Some(FilterType::Spline36),
        5 => Some(FilterType::Lanczos { taps: 3 }),
        _ => None,
    }
}

fn decode_format(f: &vfc_image_format) -> Result<vfc_core::ImageFormat, c_int> {
    let bad = |what: &str| -> c_int { set_error(VFC_ERROR_INVALID_ENUM, format!("bad {}", what)) };

    Ok(vfc_core::ImageFormat {
        width: f.width,
        height: f.height,
        pixel_type: decode_pixel_type(f.pixel_type).ok_or_else(|| bad("pixel_type"))?,
        depth: f.depth,
        subsample_w: f.subsample_w,
        subsample_h: f.subsample_h,
        color_family: decode_color_family(f.color_family).ok_or_else(|| bad("color_family"))?,
        matrix: decode_matrix(f.matrix_coefficients).ok_or_else(|| bad("matrix"))?,
        transfer: decode_transfer(f.transfer_characteristics).ok_or_else(|| bad("transfer"))?,
        primaries: decode_primaries(f.color_primaries).ok_or_else(|| bad("primaries"))?,
        pixel_range: match f.pixel_range {
            0 => ColorRange::Limited,
            1 => ColorRange::Full,
            _ => return Err(bad("pixel_range")),
        },
        field_parity: match f.field_parity {
            0 => FieldParity::Progressive,
            1 => FieldParity::Top,
            2 => FieldParity::Bottom,
            _ => return Err(bad("field_parity")),
        },
        chroma_location: match f.chroma_location {
            0 => ChromaLocation::Left,
            1 => ChromaLocation::Center,
            2 => ChromaLocation::TopLeft,
            3 => ChromaLocation::Top,
            4 => ChromaLocation::BottomLeft,
            5 => ChromaLocation::Bottom,
            _ => return Err(bad("chroma_location")),
        },
        alpha: match f.alpha {
            0 => AlphaType::None,
            1 => AlphaType::Straight,
            2 => AlphaType::Premultiplied,
            _ => return Err(bad("alpha")),
        },
    })
}

fn decode_params(p: &vfc_graph_builder_params) -> Result<GraphBuilderParams, c_int> {
    let bad = |what: &str| -> c_int { set_error(VFC_ERROR_INVALID_ENUM, format!("bad {}", what)) };

    Ok(GraphBuilderParams {
        filter: decode_filter(p.resample_filter).ok_or_else(|| bad("resample_filter"))?,
        filter_uv: decode_filter(p.resample_filter_uv).ok_or_else(|| bad("resample_filter_uv"))?,
        dither_type: match p.dither_type {
            0 => DitherType::None,
            1 => DitherType::Ordered,
            2 => DitherType::ErrorDiffusion,
            _ => return Err(bad("dither_type")),
        },
        nominal_peak_luminance: p.nominal_peak_luminance,
        allow_approximate_gamma: p.allow_approximate_gamma != 0,
        scene_referred: p.scene_referred != 0,
        cpu: match p.cpu_type {
            0 => CpuClass::None,
            1 => CpuClass::Auto,
            2 => CpuClass::Baseline,
            3 => CpuClass::Extended,
            4 => CpuClass::Wide64,
            _ => return Err(bad("cpu_type")),
        },
        ..GraphBuilderParams::default()
    })
}

fn decode_buffer(b: &vfc_image_buffer) -> ImageBuffer {
    let mut out = ImageBuffer::new();
    for p in 0..4 {
        out.planes[p] = LineBuffer::new(b.data[p] as *mut u8, b.stride[p], b.mask[p]);
    }
    out
}

/// Fills a format with progressive, limited-range, unspecified-colorimetry
/// defaults.
///
/// # Safety
///
/// `format` must point to writable memory of the right size.
#[no_mangle]
pub unsafe extern "C" fn vfc_image_format_default(format: *mut vfc_image_format) {
    if format.is_null() {
        return;
    }
    *format = vfc_image_format {
        width: 0,
        height: 0,
        pixel_type: 0,
        subsample_w: 0,
        subsample_h: 0,
        color_family: 0,
        matrix_coefficients: 2,
        transfer_characteristics: 2,
        color_primaries: 2,
        depth: 8,
        pixel_range: 0,
        field_parity: 0,
        chroma_location: 0,
        alpha: 0,
    };
}

/// Fills builder params with their defaults.
///
/// # Safety
///
/// `params` must point to writable memory of the right size.
#[no_mangle]
pub unsafe extern "C" fn vfc_graph_builder_params_default(params: *mut vfc_graph_builder_params) {
    if params.is_null() {
        return;
    }
    *params = vfc_graph_builder_params {
        nominal_peak_luminance: 100.0,
        allow_approximate_gamma: 0,
        scene_referred: 0,
        resample_filter: 2,
        resample_filter_uv: 1,
        dither_type: 0,
        cpu_type: 1,
    };
}

/// Smallest mask `2^k - 1` covering `count` lines, or [`VFC_BUFFER_MAX`].
#[no_mangle]
pub extern "C" fn vfc_select_buffer_mask(count: u32) -> u32 {
    vfc_core::select_buffer_mask(count)
}

/// Copies the current thread's last error message into `buf` and returns
/// its status code.
///
/// # Safety
///
/// `buf` must be valid for `n` bytes, or null with `n == 0`.
#[no_mangle]
pub unsafe extern "C" fn vfc_get_last_error(buf: *mut c_char, n: usize) -> c_int {
    LAST_ERROR.with(|e| {
        let (code, msg) = &*e.borrow();
        if !buf.is_null() && n > 0 {
            let bytes = msg.as_bytes();
            let len = bytes.len().min(n - 1);
            std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, buf, len);
            *buf.add(len) = 0;
        }
        *code
    })
}

/// Builds a conversion graph, or returns null; query the failure with
/// [`vfc_get_last_error`].
///
/// # Safety
///
/// All pointers must be valid; `params` may be null for defaults.
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_build(
    src_format: *const vfc_image_format,
    dst_format: *const vfc_image_format,
    params: *const vfc_graph_builder_params,
) -> *mut vfc_filter_graph {
    clear_error();
    if src_format.is_null() || dst_format.is_null() {
        set_error(VFC_ERROR_INVALID_ARGUMENT, "null format");
        return std::ptr::null_mut();
    }

    let result = catch_unwind(AssertUnwindSafe(|| -> Result<FilterGraph, c_int> {
        let src = decode_format(&*src_format)?;
        let dst = decode_format(&*dst_format)?;
        let p = if params.is_null() {
            GraphBuilderParams::default()
        } else {
            decode_params(&*params)?
        };
        build_filter_graph(&src, &dst, &p)
            .map_err(|e| set_error(graph_error_code(&e), e.to_string()))
    }));

    match result {
        Ok(Ok(graph)) => Box::into_raw(Box::new(vfc_filter_graph { inner: graph })),
        Ok(Err(_)) => std::ptr::null_mut(),
        Err(_) => {
            set_error(VFC_ERROR_INTERNAL, "panic during graph build");
            std::ptr::null_mut()
        }
    }
}

/// Frees a graph handle; null is ignored.
///
/// # Safety
///
/// `graph` must be a live handle from [`vfc_filter_graph_build`].
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_free(graph: *mut vfc_filter_graph) {
    if !graph.is_null() {
        drop(Box::from_raw(graph));
    }
}

/// Writes the required `tmp` size in bytes to `out`.
///
/// # Safety
///
/// `graph` and `out` must be valid.
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_get_tmp_size(
    graph: *const vfc_filter_graph,
    out: *mut usize,
) -> c_int {
    if graph.is_null() || out.is_null() {
        return set_error(VFC_ERROR_INVALID_ARGUMENT, "null argument");
    }
    *out = (*graph).inner.get_tmp_size();
    VFC_ERROR_SUCCESS
}

/// Writes the source ring window (luma lines) to `out`.
///
/// # Safety
///
/// `graph` and `out` must be valid.
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_get_input_buffering(
    graph: *const vfc_filter_graph,
    out: *mut c_uint,
) -> c_int {
    if graph.is_null() || out.is_null() {
        return set_error(VFC_ERROR_INVALID_ARGUMENT, "null argument");
    }
    *out = (*graph).inner.get_input_buffering();
    VFC_ERROR_SUCCESS
}

/// Writes the sink ring window (luma lines) to `out`.
///
/// # Safety
///
/// `graph` and `out` must be valid.
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_get_output_buffering(
    graph: *const vfc_filter_graph,
    out: *mut c_uint,
) -> c_int {
    if graph.is_null() || out.is_null() {
        return set_error(VFC_ERROR_INVALID_ARGUMENT, "null argument");
    }
    *out = (*graph).inner.get_output_buffering();
    VFC_ERROR_SUCCESS
}

/// Runs the graph.
///
/// `tmp` must be 64-byte aligned and at least
/// [`vfc_filter_graph_get_tmp_size`] bytes. Callbacks may be null when the
/// corresponding buffer holds the whole image.
///
/// # Safety
///
/// All pointers must be valid for the duration of the call; buffer plane
/// pointers must cover the declared windows.
#[no_mangle]
pub unsafe extern "C" fn vfc_filter_graph_process(
    graph: *const vfc_filter_graph,
    src: *const vfc_image_buffer,
    dst: *const vfc_image_buffer,
    tmp: *mut c_void,
    unpack_cb: vfc_filter_graph_callback,
    unpack_user: *mut c_void,
    pack_cb: vfc_filter_graph_callback,
    pack_user: *mut c_void,
) -> c_int {
    clear_error();
    if graph.is_null() || src.is_null() || dst.is_null() {
        return set_error(VFC_ERROR_INVALID_ARGUMENT, "null argument");
    }
    let g = &(*graph).inner;
    let tmp_size = g.get_tmp_size();
    if tmp_size > 0 && tmp.is_null() {
        return set_error(VFC_ERROR_INVALID_ARGUMENT, "null tmp buffer");
    }

    let src_buf = decode_buffer(&*src);
    let dst_buf = decode_buffer(&*dst);
    let tmp_slice = if tmp_size > 0 {
        std::slice::from_raw_parts_mut(tmp as *mut u8, tmp_size)
    } else {
        &mut [][..]
    };

    let mut unpack_closure;
    let mut pack_closure;
    let unpack: vfc_graph::Callback<'_> = match unpack_cb {
        Some(cb) => {
            unpack_closure =
                move |i: u32, l: u32, r: u32| -> i32 { unsafe { cb(unpack_user, i, l, r) } };
            Some(&mut unpack_closure)
        }
        None => None,
    };
    let pack: vfc_graph::Callback<'_> = match pack_cb {
        Some(cb) => {
            pack_closure =
                move |i: u32, l: u32, r: u32| -> i32 { unsafe { cb(pack_user, i, l, r) } };
            Some(&mut pack_closure)
        }
        None => None,
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        g.process(&src_buf, &dst_buf, tmp_slice, unpack, pack)
    }));

    match result {
        Ok(Ok(())) => VFC_ERROR_SUCCESS,
        Ok(Err(e)) => set_error(graph_error_code(&e), e.to_string()),
        Err(_) => set_error(VFC_ERROR_INTERNAL, "panic during graph run"),
    }
}
