//! Horizontal polyphase resampling filter.
//!
//! Each output column is a dot product of `filter_width` adjacent input
//! samples with a per-column coefficient row. U16 samples accumulate in
//! Q2.30 using the biased-i16 trick: samples are offset by `i16::MIN` so
//! 16x16-bit signed products cover the full unsigned range, and the bias is
//! removed after the final shift.

use std::sync::Arc;

use crate::context::{FilterContext, FIXED_SHIFT};
use half::f16;
use vfc_core::numeric::ceil_n;
use vfc_core::{
    CpuClass, Filter, FilterDescriptor, FilterFlags, KernelTier, LineBuffer, PixelType,
    PlaneDescriptor, ALIGNMENT,
};
use wide::{f32x8, i32x8};

/// Horizontal resampler over one plane.
pub struct ResizeFilterH {
    desc: FilterDescriptor,
    ctx: Arc<FilterContext>,
    pixel_type: PixelType,
    peak: i32,
    tier: KernelTier,
}

impl ResizeFilterH {
    /// Creates a horizontal resampler producing `height` rows of
    /// `ctx.filter_rows` samples each.
    pub fn new(
        ctx: Arc<FilterContext>,
        pixel_type: PixelType,
        depth: u32,
        height: u32,
        cpu: CpuClass,
    ) -> Self {
        let scratchpad_size = if pixel_type == PixelType::F16 {
            // f32 staging for one input row and one output row.
            ceil_n(ctx.input_width as usize * 4, ALIGNMENT)
                + ceil_n(ctx.filter_rows as usize * 4, ALIGNMENT)
        } else {
            0
        };

        let desc = FilterDescriptor {
            format: PlaneDescriptor::new(ctx.filter_rows, height, pixel_type.size_of() as u32),
            num_deps: 1,
            num_planes: 1,
            step: 1,
            alignment_mask: 0,
            context_size: 0,
            scratchpad_size,
            flags: FilterFlags {
                same_row: true,
                ..Default::default()
            },
        };

        Self {
            desc,
            ctx,
            pixel_type,
            peak: ((1u32 << depth) - 1) as i32,
            tier: cpu.kernel_tier(),
        }
    }
}

impl Filter for ResizeFilterH {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.desc
    }

    fn row_deps(&self, i: u32) -> (u32, u32) {
        (i, i + 1)
    }

    fn col_deps(&self, left: u32, right: u32) -> (u32, u32) {
        let mut lo = u32::MAX;
        let mut hi = 0u32;
        for j in left..right {
            let l = self.ctx.left[j as usize];
            lo = lo.min(l);
            hi = hi.max(l + self.ctx.filter_width);
        }
        (lo.min(hi), hi.min(self.ctx.input_width))
    }

    fn process(
        &self,
        deps: &[LineBuffer],
        dst: &[LineBuffer],
        i: u32,
        left: u32,
        right: u32,
        _ctx: &mut [u8],
        scratch: &mut [u8],
    ) {
        let in_w = self.ctx.input_width as usize;
        let out_w = self.ctx.filter_rows as usize;
        let (left, right) = (left as usize, right as usize);

        match self.pixel_type {
            PixelType::U16 => {
                let src: &[u16] = unsafe { deps[0].row_slice(i, 0, in_w) };
                let dst: &mut [u16] = unsafe { dst[0].row_slice_mut(i, 0, out_w) };
                match self.tier {
                    KernelTier::Scalar => {
                        resize_line_h_u16_c(&self.ctx, src, dst, left, right, self.peak)
                    }
                    KernelTier::Vector => {
                        resize_line_h_u16_w(&self.ctx, src, dst, left, right, self.peak)
                    }
                }
            }
            PixelType::F32 => {
                let src: &[f32] = unsafe { deps[0].row_slice(i, 0, in_w) };
                let dst: &mut [f32] = unsafe { dst[0].row_slice_mut(i, 0, out_w) };
                match self.tier {
                    KernelTier::Scalar => resize_line_h_f32_c(&self.ctx, src, dst, left, right),
                    KernelTier::Vector => resize_line_h_f32_w(&self.ctx, src, dst, left, right),
                }
            }
            PixelType::F16 => {
                let src: &[f16] = unsafe { deps[0].row_slice(i, 0, in_w) };
                let dst: &mut [f16] = unsafe { dst[0].row_slice_mut(i, 0, out_w) };

                let (src_f32, rest) = scratch.split_at_mut(ceil_n(in_w * 4, ALIGNMENT));
                let src_f32 = bytes_as_f32(src_f32, in_w);
                let dst_f32 = bytes_as_f32(rest, out_w);

                for (d, s) in src_f32.iter_mut().zip(src.iter()) {
                    *d = s.to_f32();
                }
                match self.tier {
                    KernelTier::Scalar => {
                        resize_line_h_f32_c(&self.ctx, src_f32, dst_f32, left, right)
                    }
                    KernelTier::Vector => {
                        resize_line_h_f32_w(&self.ctx, src_f32, dst_f32, left, right)
                    }
                }
                for j in left..right {
                    dst[j] = f16::from_f32(dst_f32[j]);
                }
            }
            PixelType::U8 => unreachable!("8-bit planes are widened before resampling"),
        }
    }
}

/// Reinterprets the head of an aligned byte region as f32 samples.
fn bytes_as_f32(bytes: &mut [u8], len: usize) -> &mut [f32] {
    debug_assert!(bytes.as_ptr() as usize % std::mem::align_of::<f32>() == 0);
    debug_assert!(bytes.len() >= len * 4);
    unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut f32, len) }
}

fn resize_line_h_u16_c(
    ctx: &FilterContext,
    src: &[u16],
    dst: &mut [u16],
    left: usize,
    right: usize,
    peak: i32,
) {
    for j in left..right {
        let top = ctx.left[j] as usize;
        let coeffs = ctx.coeffs_i16(j as u32);

        let mut accum = 0i32;
        for (k, &c) in coeffs.iter().enumerate() {
            let x = src[top + k] as i32 + i16::MIN as i32;
            accum += c as i32 * x;
        }

        let val = ((accum + (1 << (FIXED_SHIFT - 1))) >> FIXED_SHIFT) - i16::MIN as i32;
        dst[j] = val.clamp(0, peak) as u16;
    }
}

fn resize_line_h_u16_w(
    ctx: &FilterContext,
    src: &[u16],
    dst: &mut [u16],
    left: usize,
    right: usize,
    peak: i32,
) {
    let fw = ctx.filter_width as usize;
    let bias = i32x8::splat(i16::MIN as i32);

    for j in left..right {
        let top = ctx.left[j] as usize;
        let coeffs = ctx.coeffs_i16(j as u32);

        let mut acc = i32x8::splat(0);
        let mut k = 0usize;
        while k + 8 <= fw {
            let c = i32x8::from([
                coeffs[k] as i32,
                coeffs[k + 1] as i32,
                coeffs[k + 2] as i32,
                coeffs[k + 3] as i32,
                coeffs[k + 4] as i32,
                coeffs[k + 5] as i32,
                coeffs[k + 6] as i32,
                coeffs[k + 7] as i32,
            ]);
            let x = i32x8::from([
                src[top + k] as i32,
                src[top + k + 1] as i32,
                src[top + k + 2] as i32,
                src[top + k + 3] as i32,
                src[top + k + 4] as i32,
                src[top + k + 5] as i32,
                src[top + k + 6] as i32,
                src[top + k + 7] as i32,
            ]) + bias;
            acc += c * x;
            k += 8;
        }

        let mut accum: i32 = acc.to_array().iter().sum();
        for k in k..fw {
            accum += coeffs[k] as i32 * (src[top + k] as i32 + i16::MIN as i32);
        }

        let val = ((accum + (1 << (FIXED_SHIFT - 1))) >> FIXED_SHIFT) - i16::MIN as i32;
        dst[j] = val.clamp(0, peak) as u16;
    }
}

fn resize_line_h_f32_c(ctx: &FilterContext, src: &[f32], dst: &mut [f32], left: usize, right: usize) {
    for j in left..right {
        let top = ctx.left[j] as usize;
        let coeffs = ctx.coeffs_f32(j as u32);

        let mut accum = 0.0f32;
        for (k, &c) in coeffs.iter().enumerate() {
            accum += c * src[top + k];
        }
        dst[j] = accum;
    }
}

fn resize_line_h_f32_w(ctx: &FilterContext, src: &[f32], dst: &mut [f32], left: usize, right: usize) {
    let fw = ctx.filter_width as usize;

    for j in left..right {
        let top = ctx.left[j] as usize;
        let coeffs = ctx.coeffs_f32(j as u32);

        let mut acc = f32x8::splat(0.0);
        let mut k = 0usize;
        while k + 8 <= fw {
            let c = f32x8::from([
                coeffs[k],
                coeffs[k + 1],
                coeffs[k + 2],
                coeffs[k + 3],
                coeffs[k + 4],
                coeffs[k + 5],
                coeffs[k + 6],
                coeffs[k + 7],
            ]);
            let x = f32x8::from([
                src[top + k],
                src[top + k + 1],
                src[top + k + 2],
                src[top + k + 3],
                src[top + k + 4],
                src[top + k + 5],
                src[top + k + 6],
                src[top + k + 7],
            ]);
            acc = c.mul_add(x, acc);
            k += 8;
        }

        let mut accum: f32 = acc.to_array().iter().sum();
        for k in k..fw {
            accum += coeffs[k] * src[top + k];
        }
        dst[j] = accum;
    }
}
