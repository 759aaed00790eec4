//! Polyphase coefficient contexts.
//!
//! [`compute_filter`] turns a [`FilterType`] plus a 1-D scale description
//! into a [`FilterContext`]: one row of coefficients per output index, in
//! both f32 and Q1.14 fixed point, with border taps reflected back into
//! range. Contexts are immutable after construction and shared between the
//! horizontal and vertical filter instances that use them.

use crate::error::{ResizeError, ResizeResult};
use crate::filter::FilterType;
use tracing::debug;
use vfc_core::numeric::{ceil_n, checked_mul, round_half_even};
use vfc_core::{AlignedVec, ALIGNMENT};

/// Unity in Q1.14 fixed point.
pub const FIXED_ONE: i32 = 1 << 14;

/// Bits shifted out when reducing a Q2.30 accumulator.
pub const FIXED_SHIFT: u32 = 14;

/// Precomputed per-output-row data for a 1-D polyphase filter.
///
/// Row `i` of the table holds `filter_width` coefficients applying to input
/// samples `left[i] .. left[i] + filter_width`. Rows are zero-padded to
/// `stride` (f32) / `stride_i16` (Q1.14) elements so vector kernels may
/// overread within the row.
///
/// Invariants:
/// - `left[i] + filter_width <= input_width` for every row.
/// - Each f32 row sums to 1.0 (within rounding); each i16 row sums to
///   exactly 16384.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Taps per output row.
    pub filter_width: u32,
    /// Number of output rows (the destination dimension).
    pub filter_rows: u32,
    /// Input dimension after border clipping.
    pub input_width: u32,
    /// Row stride of `data` in f32 elements.
    pub stride: u32,
    /// Row stride of `data_i16` in i16 elements.
    pub stride_i16: u32,
    /// f32 coefficients, `filter_rows * stride` elements.
    pub data: AlignedVec<f32>,
    /// Q1.14 coefficients, `filter_rows * stride_i16` elements.
    pub data_i16: AlignedVec<i16>,
    /// First input sample consumed by each output row.
    pub left: Vec<u32>,
}

impl FilterContext {
    /// f32 coefficient row for output index `i`.
    #[inline]
    pub fn coeffs_f32(&self, i: u32) -> &[f32] {
        let start = (i * self.stride) as usize;
        &self.data[start..start + self.filter_width as usize]
    }

    /// Q1.14 coefficient row for output index `i`.
    #[inline]
    pub fn coeffs_i16(&self, i: u32) -> &[i16] {
        let start = (i * self.stride_i16) as usize;
        &self.data_i16[start..start + self.filter_width as usize]
    }
}

/// Reflects an out-of-range sample index back into `[0, size)`.
fn mirror_index(idx: i64, size: i64) -> i64 {
    let mut i = idx;
    // Repeated reflection handles taps wider than the image edge region.
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= size {
            i = 2 * size - i - 1;
        } else {
            return i;
        }
    }
}

/// Builds the coefficient context for one axis.
///
/// `src_dim`/`dst_dim` are the axis sizes in samples. `shift` moves the
/// sampling grid toward negative coordinates; `width` is the active source
/// extent (normally `src_dim as f64`, smaller or larger when resampling a
/// sub-pixel region).
pub fn compute_filter(
    filter: FilterType,
    src_dim: u32,
    dst_dim: u32,
    shift: f64,
    width: f64,
) -> ResizeResult<FilterContext> {
    if src_dim == 0 || dst_dim == 0 || width <= 0.0 {
        return Err(ResizeError::InvalidDimensions(format!(
            "resize of {} -> {} samples (active width {})",
            src_dim, dst_dim, width
        )));
    }

    let scale = dst_dim as f64 / width;
    let step = scale.min(1.0);
    let support = filter.support() / step;
    let filter_width = ((support.ceil() as u32) * 2).max(1);

    if filter_width > src_dim {
        return Err(ResizeError::FilterTooWide {
            filter_width,
            input_width: src_dim,
        });
    }

    let stride = ceil_n(filter_width as usize, ALIGNMENT / std::mem::size_of::<f32>()) as u32;
    let stride_i16 = ceil_n(filter_width as usize, ALIGNMENT / std::mem::size_of::<i16>()) as u32;

    let data_len = checked_mul(stride as usize, dst_dim as usize)?;
    let data_i16_len = checked_mul(stride_i16 as usize, dst_dim as usize)?;

    let mut data: AlignedVec<f32> = AlignedVec::zeroed(data_len);
    let mut data_i16: AlignedVec<i16> = AlignedVec::zeroed(data_i16_len);
    let mut left = vec![0u32; dst_dim as usize];

    let mut row = vec![0.0f64; filter_width as usize];
    let mut folded = vec![0.0f64; filter_width as usize];

    for i in 0..dst_dim {
        // Continuous source coordinate of the output sample center, with
        // sample centers at integer coordinates.
        let pos = (i as f64 + 0.5) / scale + shift - 0.5;
        // First tap strictly inside the support window (pos - S', pos + S'].
        let begin = (pos - support).floor() as i64 + 1;

        // The kernel is sampled at unit spacing scaled by `step`, widening
        // its effective support on downscale.
        let mut sum = 0.0f64;
        for (k, r) in row.iter_mut().enumerate() {
            *r = filter.eval(((begin + k as i64) as f64 - pos) * step);
            sum += *r;
        }

        // Fold out-of-range taps across the image border, then renormalize.
        let clamped_left = begin.clamp(0, src_dim as i64 - filter_width as i64) as u32;
        folded.iter_mut().for_each(|x| *x = 0.0);
        for (k, &r) in row.iter().enumerate() {
            let idx = mirror_index(begin + k as i64, src_dim as i64);
            let rel = (idx - clamped_left as i64).clamp(0, filter_width as i64 - 1) as usize;
            folded[rel] += r;
        }

        left[i as usize] = clamped_left;

        let f32_row = &mut data[(i * stride) as usize..(i * stride + filter_width) as usize];
        for (k, &c) in folded.iter().enumerate() {
            f32_row[k] = (c / sum) as f32;
        }

        quantize_row(
            &folded,
            sum,
            &mut data_i16[(i * stride_i16) as usize..(i * stride_i16 + filter_width) as usize],
        );
    }

    debug!(
        filter = filter.name(),
        src_dim, dst_dim, filter_width, "computed filter context"
    );

    Ok(FilterContext {
        filter_width,
        filter_rows: dst_dim,
        input_width: src_dim,
        stride,
        stride_i16,
        data,
        data_i16,
        left,
    })
}

/// Quantizes one coefficient row to Q1.14 so it sums to exactly 16384.
///
/// Rounds each tap to nearest-even, then puts the residual on the tap with
/// the largest magnitude.
fn quantize_row(folded: &[f64], sum: f64, out: &mut [i16]) {
    let mut total: i32 = 0;
    let mut max_idx = 0usize;
    let mut max_mag = 0i32;

    for (k, &c) in folded.iter().enumerate() {
        let q = round_half_even(c / sum * FIXED_ONE as f64) as i32;
        out[k] = q as i16;
        total += q;
        if q.abs() > max_mag {
            max_mag = q.abs();
            max_idx = k;
        }
    }

    let err = FIXED_ONE - total;
    out[max_idx] = (out[max_idx] as i32 + err) as i16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rows_sum_to_unity() {
        let ctx = compute_filter(FilterType::Lanczos { taps: 3 }, 1920, 1280, 0.0, 1920.0)
            .unwrap();
        for i in 0..ctx.filter_rows {
            let fsum: f32 = ctx.coeffs_f32(i).iter().sum();
            assert_relative_eq!(fsum, 1.0, epsilon = 1e-5);
            let isum: i32 = ctx.coeffs_i16(i).iter().map(|&c| c as i32).sum();
            assert_eq!(isum, FIXED_ONE, "row {}", i);
        }
    }

    #[test]
    fn test_left_in_range() {
        let ctx = compute_filter(FilterType::Spline36, 100, 333, 0.0, 100.0).unwrap();
        for i in 0..ctx.filter_rows {
            let l = ctx.left[i as usize];
            assert!(l + ctx.filter_width <= ctx.input_width, "row {}", i);
        }
    }

    #[test]
    fn test_identity_is_unit_impulse() {
        // dst == src with zero shift: every row is 1.0 at the center tap.
        let ctx = compute_filter(FilterType::Bilinear, 64, 64, 0.0, 64.0).unwrap();
        for i in 0..64 {
            let coeffs = ctx.coeffs_i16(i);
            let center = (i - ctx.left[i as usize]) as usize;
            assert_eq!(coeffs[center], FIXED_ONE as i16);
            for (k, &c) in coeffs.iter().enumerate() {
                if k != center {
                    assert_eq!(c, 0);
                }
            }
        }
    }

    #[test]
    fn test_downscale_widens_support() {
        let up = compute_filter(FilterType::Bilinear, 100, 200, 0.0, 100.0).unwrap();
        let down = compute_filter(FilterType::Bilinear, 200, 100, 0.0, 200.0).unwrap();
        assert!(down.filter_width > up.filter_width);
    }

    #[test]
    fn test_filter_rows_match_chroma_halving() {
        let luma = compute_filter(FilterType::Lanczos { taps: 3 }, 1920, 1280, 0.0, 1920.0)
            .unwrap();
        let chroma = compute_filter(FilterType::Lanczos { taps: 3 }, 960, 640, 0.0, 960.0)
            .unwrap();
        assert_eq!(luma.filter_rows, 1280);
        assert_eq!(chroma.filter_rows, 640);
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(compute_filter(FilterType::Bilinear, 0, 10, 0.0, 0.0).is_err());
        assert!(compute_filter(FilterType::Lanczos { taps: 4 }, 4, 2, 0.0, 4.0).is_err());
    }

    #[test]
    fn test_mirror_index() {
        assert_eq!(mirror_index(-1, 10), 0);
        assert_eq!(mirror_index(-3, 10), 2);
        assert_eq!(mirror_index(10, 10), 9);
        assert_eq!(mirror_index(12, 10), 7);
        assert_eq!(mirror_index(5, 10), 5);
    }
}
