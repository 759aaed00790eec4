//! Floyd-Steinberg error diffusion.
//!
//! Rasterizes left-to-right, top-to-bottom, propagating each pixel's
//! quantization error to four neighbors: right 7/16, lower-left 3/16,
//! below 5/16, lower-right 1/16. No serpentine scanning.
//!
//! The filter is position-dependent: two error rows rotate through the
//! per-run context, so rows must be produced strictly in order and always
//! over the full width (`entire_row` is set, which also disables
//! horizontal tiling for any graph containing this filter).

use half::f16;
use vfc_core::numeric::ceil_n;
use vfc_core::{
    Filter, FilterDescriptor, FilterFlags, LineBuffer, PixelFormat, PixelType, PlaneDescriptor,
    ALIGNMENT,
};

use crate::convert::{from_float_scale_offset, to_float_scale_offset};

/// One-pixel margin on each side of an error row.
const PAD: usize = 1;

/// Floyd-Steinberg conversion to an integer format.
pub struct ErrorDiffusionFilter {
    desc: FilterDescriptor,
    in_type: PixelType,
    out_type: PixelType,
    scale: f32,
    offset: f32,
    peak: i32,
    width: u32,
}

impl ErrorDiffusionFilter {
    /// Creates a diffusion filter from `src_format` to integer `dst_format`.
    pub fn new(
        src_format: &PixelFormat,
        dst_format: &PixelFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let (so, oo) = from_float_scale_offset(dst_format);
        let (scale, offset) = if src_format.pixel_type.is_float() {
            (so, oo)
        } else {
            let (si, oi) = to_float_scale_offset(src_format);
            (si * so, oi * so + oo)
        };

        let row_len = width as usize + 2 * PAD;
        let desc = FilterDescriptor {
            format: PlaneDescriptor::new(width, height, dst_format.pixel_type.size_of() as u32),
            num_deps: 1,
            num_planes: 1,
            step: 1,
            alignment_mask: 0,
            context_size: ceil_n(2 * row_len * std::mem::size_of::<f32>(), ALIGNMENT),
            scratchpad_size: 0,
            flags: FilterFlags {
                same_row: true,
                entire_row: true,
                ..Default::default()
            },
        };

        Self {
            desc,
            in_type: src_format.pixel_type,
            out_type: dst_format.pixel_type,
            scale,
            offset,
            peak: dst_format.integer_peak() as i32,
            width,
        }
    }

    /// Splits the context into the (previous, next) error rows for line `i`.
    fn error_rows<'c>(&self, ctx: &'c mut [u8], i: u32) -> (&'c mut [f32], &'c mut [f32]) {
        let row_len = self.width as usize + 2 * PAD;
        let all: &mut [f32] = unsafe {
            std::slice::from_raw_parts_mut(ctx.as_mut_ptr() as *mut f32, 2 * row_len)
        };
        let (a, b) = all.split_at_mut(row_len);
        if i % 2 == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl Filter for ErrorDiffusionFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.desc
    }

    fn row_deps(&self, i: u32) -> (u32, u32) {
        (i, i + 1)
    }

    fn col_deps(&self, _left: u32, _right: u32) -> (u32, u32) {
        (0, self.width)
    }

    fn process(
        &self,
        deps: &[LineBuffer],
        dst: &[LineBuffer],
        i: u32,
        _left: u32,
        _right: u32,
        ctx: &mut [u8],
        _scratch: &mut [u8],
    ) {
        let w = self.width as usize;
        let (prev, next) = self.error_rows(ctx, i);
        next.fill(0.0);

        macro_rules! diffuse_loop {
            ($src:ty, $to_f32:expr, $out:ty) => {{
                let src: &[$src] = unsafe { deps[0].row_slice(i, 0, w) };
                let out: &mut [$out] = unsafe { dst[0].row_slice_mut(i, 0, w) };

                let mut err_right = 0.0f32;
                for j in 0..w {
                    let x = $to_f32(&src[j]) * self.scale + self.offset;
                    let val = x + err_right + prev[PAD + j];
                    let q = (val.round_ties_even() as i32).clamp(0, self.peak);
                    let err = val - q as f32;

                    err_right = err * (7.0 / 16.0);
                    next[PAD + j - 1] += err * (3.0 / 16.0);
                    next[PAD + j] += err * (5.0 / 16.0);
                    next[PAD + j + 1] += err * (1.0 / 16.0);

                    out[j] = q as $out;
                }
            }};
        }

        match (self.in_type, self.out_type) {
            (PixelType::U8, PixelType::U8) => diffuse_loop!(u8, |s: &u8| *s as f32, u8),
            (PixelType::U8, PixelType::U16) => diffuse_loop!(u8, |s: &u8| *s as f32, u16),
            (PixelType::U16, PixelType::U8) => diffuse_loop!(u16, |s: &u16| *s as f32, u8),
            (PixelType::U16, PixelType::U16) => diffuse_loop!(u16, |s: &u16| *s as f32, u16),
            (PixelType::F16, PixelType::U8) => diffuse_loop!(f16, |s: &f16| s.to_f32(), u8),
            (PixelType::F16, PixelType::U16) => diffuse_loop!(f16, |s: &f16| s.to_f32(), u16),
            (PixelType::F32, PixelType::U8) => diffuse_loop!(f32, |s: &f32| *s, u8),
            (PixelType::F32, PixelType::U16) => diffuse_loop!(f32, |s: &f32| *s, u16),
            _ => unreachable!("diffusion output must be integer"),
        }
    }
}
