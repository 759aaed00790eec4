//! Integer widening and integer-to-float conversion filters.
//!
//! Two pointwise families live here:
//!
//! - [`LeftShiftFilter`] renormalizes narrow-depth integer samples into a
//!   wider container, preserving MSB alignment (`x << shift`). Limited-range
//!   code values scale exactly under a shift, so no rounding is involved.
//! - [`ConvertToFloatFilter`] maps integer code values to normalized floats
//!   via `scale * x + offset`, producing [0, 1] for luma/RGB planes and
//!   [-0.5, 0.5] for chroma planes.

use half::f16;
use vfc_core::{
    CpuClass, Filter, FilterDescriptor, KernelTier, LineBuffer, PixelFormat, PixelType,
    PlaneDescriptor,
};
use wide::f32x8;

/// Normalization of an integer format to float: `norm = scale * x + offset`.
///
/// Limited-range luma spans 16..235 (scaled by depth), limited chroma
/// 16..240 centered on `2^(depth-1)`; full range spans the whole code space.
pub fn to_float_scale_offset(format: &PixelFormat) -> (f32, f32) {
    let depth = format.depth;
    if format.fullrange {
        let scale = 1.0 / ((1u32 << depth) - 1) as f32;
        if format.chroma {
            (scale, -(((1u32 << (depth - 1)) as f32) * scale))
        } else {
            (scale, 0.0)
        }
    } else if format.chroma {
        let scale = 1.0 / (224 << (depth - 8)) as f32;
        (scale, -(((1u32 << (depth - 1)) as f32) * scale))
    } else {
        let scale = 1.0 / (219 << (depth - 8)) as f32;
        (scale, -((16u32 << (depth - 8)) as f32 * scale))
    }
}

/// Inverse normalization: `code = scale * norm + offset`.
pub fn from_float_scale_offset(format: &PixelFormat) -> (f32, f32) {
    let (s, o) = to_float_scale_offset(format);
    (1.0 / s, -o / s)
}

/// Pointwise `x << shift` between integer containers.
pub struct LeftShiftFilter {
    desc: FilterDescriptor,
    shift: u32,
    from: PixelType,
    to: PixelType,
}

impl LeftShiftFilter {
    /// Creates a shift filter for a `width` x `height` plane.
    pub fn new(from: PixelType, to: PixelType, shift: u32, width: u32, height: u32) -> Self {
        let mut desc =
            FilterDescriptor::pointwise(PlaneDescriptor::new(width, height, to.size_of() as u32));
        desc.flags.in_place = from.size_of() == to.size_of();
        Self {
            desc,
            shift,
            from,
            to,
        }
    }
}

impl Filter for LeftShiftFilter {
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
        let shift = self.shift;

        match (self.from, self.to) {
            (PixelType::U8, PixelType::U8) => {
                let src: &[u8] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u8] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for (d, &s) in out.iter_mut().zip(src.iter()) {
                    *d = s << shift;
                }
            }
            (PixelType::U8, PixelType::U16) => {
                let src: &[u8] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u16] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for (d, &s) in out.iter_mut().zip(src.iter()) {
                    *d = (s as u16) << shift;
                }
            }
            (PixelType::U16, PixelType::U8) => {
                // Narrowing copy of a plane whose depth fits in a byte.
                let src: &[u16] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u8] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for (d, &s) in out.iter_mut().zip(src.iter()) {
                    *d = (s << shift) as u8;
                }
            }
            (PixelType::U16, PixelType::U16) => {
                let src: &[u16] = unsafe { deps[0].row_slice(i, l, r) };
                let out: &mut [u16] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for (d, &s) in out.iter_mut().zip(src.iter()) {
                    *d = s << shift;
                }
            }
            _ => unreachable!("left shift is defined on integer containers only"),
        }
    }
}

/// Pointwise `scale * x + offset` from integer to float.
pub struct ConvertToFloatFilter {
    desc: FilterDescriptor,
    scale: f32,
    offset: f32,
    from: PixelType,
    to: PixelType,
    tier: KernelTier,
}

impl ConvertToFloatFilter {
    /// Creates a conversion from `src_format` into `to` (F16 or F32).
    pub fn new(
        src_format: &PixelFormat,
        to: PixelType,
        width: u32,
        height: u32,
        cpu: CpuClass,
    ) -> Self {
        let (scale, offset) = to_float_scale_offset(src_format);
        let mut desc =
            FilterDescriptor::pointwise(PlaneDescriptor::new(width, height, to.size_of() as u32));
        desc.flags.in_place = src_format.pixel_type.size_of() == to.size_of();
        Self {
            desc,
            scale,
            offset,
            from: src_format.pixel_type,
            to,
            tier: cpu.kernel_tier(),
        }
    }
}

impl Filter for ConvertToFloatFilter {
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

        // Widen the source to f32 lane by lane, then store as f32 or f16.
        let load = |src_u8: &[u8], src_u16: &[u16], j: usize| -> f32 {
            match self.from {
                PixelType::U8 => src_u8[j] as f32,
                PixelType::U16 => src_u16[j] as f32,
                _ => unreachable!("float sources use the f16c filters"),
            }
        };

        let (src_u8, src_u16): (&[u8], &[u16]) = match self.from {
            PixelType::U8 => (unsafe { deps[0].row_slice(i, l, r) }, &[]),
            _ => (&[], unsafe { deps[0].row_slice(i, l, r) }),
        };

        match self.to {
            PixelType::F32 => {
                let out: &mut [f32] = unsafe { dst[0].row_slice_mut(i, l, r) };
                match (self.tier, self.from) {
                    (KernelTier::Vector, PixelType::U16) => {
                        convert_w2f_w(src_u16, out, self.scale, self.offset)
                    }
                    _ => {
                        for (j, d) in out.iter_mut().enumerate() {
                            *d = load(src_u8, src_u16, j) * self.scale + self.offset;
                        }
                    }
                }
            }
            PixelType::F16 => {
                let out: &mut [f16] = unsafe { dst[0].row_slice_mut(i, l, r) };
                for (j, d) in out.iter_mut().enumerate() {
                    *d = f16::from_f32(load(src_u8, src_u16, j) * self.scale + self.offset);
                }
            }
            _ => unreachable!("conversion target must be float"),
        }
    }
}

fn convert_w2f_w(src: &[u16], dst: &mut [f32], scale: f32, offset: f32) {
    let s = f32x8::splat(scale);
    let o = f32x8::splat(offset);

    let mut j = 0usize;
    while j + 8 <= src.len() {
        let x = f32x8::from([
            src[j] as f32,
            src[j + 1] as f32,
            src[j + 2] as f32,
            src[j + 3] as f32,
            src[j + 4] as f32,
            src[j + 5] as f32,
            src[j + 6] as f32,
            src[j + 7] as f32,
        ]);
        dst[j..j + 8].copy_from_slice(&x.mul_add(s, o).to_array());
        j += 8;
    }
    for k in j..src.len() {
        dst[k] = src[k] as f32 * scale + offset;
    }
}
