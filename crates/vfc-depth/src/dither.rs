//! Rounding and ordered-dither quantization to integer formats.
//!
//! [`DitherFilter`] converts any supported input representation to an
//! integer output format in one pointwise pass: the input is widened to
//! float, mapped through a precomputed affine transform onto the output
//! code scale, optionally perturbed by an 8x8 Bayer pattern scaled to one
//! quantization step, then rounded (ties to even) and saturated.

use half::f16;
use vfc_core::{
    CpuClass, Filter, FilterDescriptor, KernelTier, LineBuffer, PixelFormat, PixelType,
    PlaneDescriptor,
};
use wide::f32x8;

use crate::convert::{from_float_scale_offset, to_float_scale_offset};

/// 8x8 Bayer index matrix.
const BAYER: [u8; 64] = [
    0, 48, 12, 60, 3, 51, 15, 63, //
    32, 16, 44, 28, 35, 19, 47, 31, //
    8, 56, 4, 52, 11, 59, 7, 55, //
    40, 24, 36, 20, 43, 27, 39, 23, //
    2, 50, 14, 62, 1, 49, 13, 61, //
    34, 18, 46, 30, 33, 17, 45, 29, //
    10, 58, 6, 54, 9, 57, 5, 53, //
    42, 26, 38, 22, 41, 25, 37, 21,
];

/// Dither amplitudes in output code units, one quantization step wide.
fn bayer_offsets() -> [f32; 64] {
    let mut out = [0.0f32; 64];
    for (d, &m) in out.iter_mut().zip(BAYER.iter()) {
        *d = (m as f32 + 0.5) / 64.0 - 0.5;
    }
    out
}

/// Quantization mode of a [`DitherFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeMode {
    /// Round to nearest, ties to even.
    Round,
    /// Add the Bayer pattern before rounding.
    Ordered,
}

/// Pointwise conversion to an integer format, with optional ordered dither.
pub struct DitherFilter {
    desc: FilterDescriptor,
    in_type: PixelType,
    out_type: PixelType,
    scale: f32,
    offset: f32,
    peak: i32,
    dither: Option<[f32; 64]>,
    tier: KernelTier,
}

impl DitherFilter {
    /// Creates a conversion from `src_format` to integer `dst_format`.
    pub fn new(
        src_format: &PixelFormat,
        dst_format: &PixelFormat,
        mode: QuantizeMode,
        width: u32,
        height: u32,
        cpu: CpuClass,
    ) -> Self {
        // Composite affine transform from input representation to output
        // code values: integer input goes through its normalization first.
        let (so, oo) = from_float_scale_offset(dst_format);
        let (scale, offset) = if src_format.pixel_type.is_float() {
            (so, oo)
        } else {
            let (si, oi) = to_float_scale_offset(src_format);
            (si * so, oi * so + oo)
        };

        let mut desc = FilterDescriptor::pointwise(PlaneDescriptor::new(
            width,
            height,
            dst_format.pixel_type.size_of() as u32,
        ));
        desc.flags.in_place =
            src_format.pixel_type.size_of() == dst_format.pixel_type.size_of();

        Self {
            desc,
            in_type: src_format.pixel_type,
            out_type: dst_format.pixel_type,
            scale,
            offset,
            peak: dst_format.integer_peak() as i32,
            dither: match mode {
                QuantizeMode::Round => None,
                QuantizeMode::Ordered => Some(bayer_offsets()),
            },
            tier: cpu.kernel_tier(),
        }
    }

    #[inline]
    fn quantize(&self, x: f32, d: f32) -> i32 {
        (x * self.scale + self.offset + d).round_ties_even() as i32
    }
}

impl Filter for DitherFilter {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.desc
    }

    fn row_deps(&self, i: u32) -> (u32, u32) {
        (i, i + 1)
    }

    fn col_deps(&self, left: u32, right: u32) -> (u32, u32) {
        (left, right)
    }

    fn process(
        &self,
        deps: &[LineBuffer],
        dst: &[LineBuffer],
        i: u32,
        left: u32,
        right: u32,
        _ctx: &mut [u8],
        _scratch: &mut [u8],
    ) {
        let (l, r) = (left as usize, right as usize);

        // Row of the dither pattern for this scanline; all-zero when the
        // mode is plain rounding.
        let mut dither_row = [0.0f32; 8];
        if let Some(pattern) = &self.dither {
            let base = ((i % 8) * 8) as usize;
            dither_row.copy_from_slice(&pattern[base..base + 8]);
        }

        macro_rules! quantize_loop {
            ($src:ty, $to_f32:expr, $out:ty) => {{
                let src: &[$src] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [$out] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for ((j, d), s) in out
                    .iter_mut()
                    .enumerate()
                    .map(|(j, d)| (j + l, d))
                    .zip(src.iter())
                {
                    let dv = dither_row[j & 7];
                    let q = self.quantize($to_f32(s), dv);
                    *d = q.clamp(0, self.peak) as $out;
                }
            }};
        }

        // The f32 round-only paths are the hot ones (the final pack of a
        // float pipeline); they get the vector kernel.
        let vectorized = self.tier == KernelTier::Vector
            && self.dither.is_none()
            && self.in_type == PixelType::F32;

        match (self.in_type, self.out_type, vectorized) {
            (PixelType::F32, PixelType::U8, true) => {
                let src: &[f32] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u8] = unsafe { dst[0].row_slice_mut(i, l, r) };
                self.quantize_row_w(src, |q, d| *d = q as u8, out);
            }
            (PixelType::F32, PixelType::U16, true) => {
                let src: &[f32] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u16] = unsafe { dst[0].row_slice_mut(i, l, r) };
                self.quantize_row_w(src, |q, d| *d = q as u16, out);
            }
            (PixelType::U8, PixelType::U8, _) => quantize_loop!(u8, |&s: &u8| s as f32, u8),
            (PixelType::U8, PixelType::U16, _) => quantize_loop!(u8, |&s: &u8| s as f32, u16),
            (PixelType::U16, PixelType::U8, _) => quantize_loop!(u16, |&s: &u16| s as f32, u8),
            (PixelType::U16, PixelType::U16, _) => quantize_loop!(u16, |&s: &u16| s as f32, u16),
            (PixelType::F16, PixelType::U8, _) => quantize_loop!(f16, |s: &f16| s.to_f32(), u8),
            (PixelType::F16, PixelType::U16, _) => quantize_loop!(f16, |s: &f16| s.to_f32(), u16),
            (PixelType::F32, PixelType::U8, _) => quantize_loop!(f32, |&s: &f32| s, u8),
            (PixelType::F32, PixelType::U16, _) => quantize_loop!(f32, |&s: &f32| s, u16),
            _ => unreachable!("dither output must be integer"),
        }
    }
}

impl DitherFilter {
    /// Vectorized round-only path; dithered rows stay scalar because the
    /// pattern index breaks lane contiguity at span edges.
    fn quantize_row_w<O>(&self, src: &[f32], store: impl Fn(i32, &mut O), out: &mut [O]) {
        let s = f32x8::splat(self.scale);
        let o = f32x8::splat(self.offset);

        let mut j = 0usize;
        while j + 8 <= src.len() {
            let x = f32x8::from([
                src[j],
                src[j + 1],
                src[j + 2],
                src[j + 3],
                src[j + 4],
                src[j + 5],
                src[j + 6],
                src[j + 7],
            ]);
            let v = x.mul_add(s, o).round().to_array();
            for (k, &vv) in v.iter().enumerate() {
                store((vv as i32).clamp(0, self.peak), &mut out[j + k]);
            }
            j += 8;
        }
        for k in j..src.len() {
            let q = (src[k] * self.scale + self.offset).round_ties_even() as i32;
            store(q.clamp(0, self.peak), &mut out[k]);
        }
    }
}
