//! Vertical polyphase resampling filter.
//!
//! Output row `i` is a weighted sum of `filter_width` adjacent input rows.
//! The kernels sweep tap-by-tap over the row span, accumulating per-column
//! partial sums in a scratchpad (i32 for the Q2.30 integer path, f32 for
//! half precision) or directly in the destination row for f32 output.

use std::sync::Arc;

use crate::context::{FilterContext, FIXED_SHIFT};
use half::f16;
use vfc_core::numeric::ceil_n;
use vfc_core::{
    CpuClass, Filter, FilterDescriptor, FilterFlags, KernelTier, LineBuffer, PixelType,
    PlaneDescriptor, ALIGNMENT,
};
use wide::{f32x8, i32x8};

/// Vertical resampler over one plane.
pub struct ResizeFilterV {
    desc: FilterDescriptor,
    ctx: Arc<FilterContext>,
    pixel_type: PixelType,
    peak: i32,
    tier: KernelTier,
}

impl ResizeFilterV {
    /// Creates a vertical resampler producing `ctx.filter_rows` rows of
    /// `width` samples each.
    pub fn new(
        ctx: Arc<FilterContext>,
        pixel_type: PixelType,
        depth: u32,
        width: u32,
        cpu: CpuClass,
    ) -> Self {
        let scratchpad_size = match pixel_type {
            // Per-column accumulators.
            PixelType::U16 | PixelType::F16 => ceil_n(width as usize * 4, ALIGNMENT),
            _ => 0,
        };

        let desc = FilterDescriptor {
            format: PlaneDescriptor::new(width, ctx.filter_rows, pixel_type.size_of() as u32),
            num_deps: 1,
            num_planes: 1,
            step: 1,
            alignment_mask: 0,
            context_size: 0,
            scratchpad_size,
            flags: FilterFlags::default(),
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

impl Filter for ResizeFilterV {
    fn descriptor(&self) -> &FilterDescriptor {
        &self.desc
    }

    fn row_deps(&self, i: u32) -> (u32, u32) {
        let top = self.ctx.left[i as usize];
        (top, (top + self.ctx.filter_width).min(self.ctx.input_width))
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
        scratch: &mut [u8],
    ) {
        let (left, right) = (left as usize, right as usize);
        let top = self.ctx.left[i as usize];
        let taps = self.ctx.filter_width as usize;
        let src = &deps[0];

        match self.pixel_type {
            PixelType::U16 => {
                let accum = bytes_as::<i32>(scratch, right);
                let coeffs = self.ctx.coeffs_i16(i);
                for (k, &c) in coeffs.iter().enumerate().take(taps) {
                    let row: &[u16] = unsafe { src.row_slice(top + k as u32, 0, right) };
                    match self.tier {
                        KernelTier::Scalar => {
                            accum_tap_u16_c(row, accum, left, right, c as i32, k == 0)
                        }
                        KernelTier::Vector => {
                            accum_tap_u16_w(row, accum, left, right, c as i32, k == 0)
                        }
                    }
                }
                let out: &mut [u16] = unsafe { dst[0].row_slice_mut(i, 0, right) };
                for j in left..right {
                    let val = ((accum[j] + (1 << (FIXED_SHIFT - 1))) >> FIXED_SHIFT)
                        - i16::MIN as i32;
                    out[j] = val.clamp(0, self.peak) as u16;
                }
            }
            PixelType::F32 => {
                let out: &mut [f32] = unsafe { dst[0].row_slice_mut(i, 0, right) };
                let coeffs = self.ctx.coeffs_f32(i);
                for (k, &c) in coeffs.iter().enumerate().take(taps) {
                    let row: &[f32] = unsafe { src.row_slice(top + k as u32, 0, right) };
                    match self.tier {
                        KernelTier::Scalar => accum_tap_f32_c(row, out, left, right, c, k == 0),
                        KernelTier::Vector => accum_tap_f32_w(row, out, left, right, c, k == 0),
                    }
                }
            }
            PixelType::F16 => {
                let accum = bytes_as::<f32>(scratch, right);
                let coeffs = self.ctx.coeffs_f32(i);
                for (k, &c) in coeffs.iter().enumerate().take(taps) {
                    let row: &[f16] = unsafe { src.row_slice(top + k as u32, 0, right) };
                    if k == 0 {
                        for j in left..right {
                            accum[j] = c * row[j].to_f32();
                        }
                    } else {
                        for j in left..right {
                            accum[j] += c * row[j].to_f32();
                        }
                    }
                }
                let out: &mut [f16] = unsafe { dst[0].row_slice_mut(i, 0, right) };
                for j in left..right {
                    out[j] = f16::from_f32(accum[j]);
                }
            }
            PixelType::U8 => unreachable!("8-bit planes are widened before resampling"),
        }
    }
}

/// Reinterprets the head of an aligned byte region as `len` samples of `T`.
fn bytes_as<T>(bytes: &mut [u8], len: usize) -> &mut [T] {
    debug_assert!(bytes.as_ptr() as usize % std::mem::align_of::<T>() == 0);
    debug_assert!(bytes.len() >= len * std::mem::size_of::<T>());
    unsafe { std::slice::from_raw_parts_mut(bytes.as_mut_ptr() as *mut T, len) }
}

fn accum_tap_u16_c(row: &[u16], accum: &mut [i32], left: usize, right: usize, c: i32, first: bool) {
    for j in left..right {
        let x = row[j] as i32 + i16::MIN as i32;
        if first {
            accum[j] = c * x;
        } else {
            accum[j] += c * x;
        }
    }
}

fn accum_tap_u16_w(row: &[u16], accum: &mut [i32], left: usize, right: usize, c: i32, first: bool) {
    let cv = i32x8::splat(c);
    let bias = i32x8::splat(i16::MIN as i32);
    let mut j = left;

    while j + 8 <= right {
        let x = i32x8::from([
            row[j] as i32,
            row[j + 1] as i32,
            row[j + 2] as i32,
            row[j + 3] as i32,
            row[j + 4] as i32,
            row[j + 5] as i32,
            row[j + 6] as i32,
            row[j + 7] as i32,
        ]) + bias;
        let prod = cv * x;
        let merged = if first {
            prod
        } else {
            prod + i32x8::from([
                accum[j],
                accum[j + 1],
                accum[j + 2],
                accum[j + 3],
                accum[j + 4],
                accum[j + 5],
                accum[j + 6],
                accum[j + 7],
            ])
        };
        accum[j..j + 8].copy_from_slice(&merged.to_array());
        j += 8;
    }
    accum_tap_u16_c(row, accum, j, right, c, first);
}

fn accum_tap_f32_c(row: &[f32], out: &mut [f32], left: usize, right: usize, c: f32, first: bool) {
    for j in left..right {
        if first {
            out[j] = c * row[j];
        } else {
            out[j] += c * row[j];
        }
    }
}

fn accum_tap_f32_w(row: &[f32], out: &mut [f32], left: usize, right: usize, c: f32, first: bool) {
    let cv = f32x8::splat(c);
    let mut j = left;

    while j + 8 <= right {
        let x = f32x8::from([
            row[j],
            row[j + 1],
            row[j + 2],
            row[j + 3],
            row[j + 4],
            row[j + 5],
            row[j + 6],
            row[j + 7],
        ]);
        let merged = if first {
            cv * x
        } else {
            cv.mul_add(
                x,
                f32x8::from([
                    out[j],
                    out[j + 1],
                    out[j + 2],
                    out[j + 3],
                    out[j + 4],
                    out[j + 5],
                    out[j + 6],
                    out[j + 7],
                ]),
            )
        };
        out[j..j + 8].copy_from_slice(&merged.to_array());
        j += 8;
    }
    accum_tap_f32_c(row, out, j, right, c, first);
}
