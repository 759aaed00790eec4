//! Half-float conversions.
//!
//! F16 is a storage format only; all arithmetic happens in F32. These two
//! pointwise filters widen and narrow rows at the pipeline boundaries. The
//! `half` crate lowers to hardware F16C conversion where the target supports
//! it and scalar emulation elsewhere.

use half::f16;
use vfc_core::{Filter, FilterDescriptor, LineBuffer, PixelType, PlaneDescriptor};

/// Pointwise f16 -> f32 widening.
pub struct F16ToF32Filter {
    desc: FilterDescriptor,
}

impl F16ToF32Filter {
    /// Creates the filter for a `width` x `height` plane.
    pub fn new(width: u32, height: u32) -> Self {
        let mut desc = FilterDescriptor::pointwise(PlaneDescriptor::new(
            width,
            height,
            PixelType::F32.size_of() as u32,
        ));
        desc.flags.in_place = false;
        Self { desc }
    }
}

impl Filter for F16ToF32Filter {
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
        let src: &[f16] = unsafe { deps[0].row_slice(i, l, r) };
        let out: &mut [f32] = unsafe { dst[0].row_slice_mut(i, l, r) };
        for (d, &s) in out.iter_mut().zip(src.iter()) {
            *d = s.to_f32();
        }
    }
}

/// Pointwise f32 -> f16 narrowing.
pub struct F32ToF16Filter {
    desc: FilterDescriptor,
}

impl F32ToF16Filter {
    /// Creates the filter for a `width` x `height` plane.
    pub fn new(width: u32, height: u32) -> Self {
        let mut desc = FilterDescriptor::pointwise(PlaneDescriptor::new(
            width,
            height,
            PixelType::F16.size_of() as u32,
        ));
        desc.flags.in_place = false;
        Self { desc }
    }
}

impl Filter for F32ToF16Filter {
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
        let src: &[f32] = unsafe { deps[0].row_slice(i, l, r) };
        let out: &mut [f16] = unsafe { dst[0].row_slice_mut(i, l, r) };
        for (d, &s) in out.iter_mut().zip(src.iter()) {
            *d = f16::from_f32(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfc_core::{AlignedVec, BUFFER_MAX};

    #[test]
    fn test_f16_round_trip() {
        let widen = F16ToF32Filter::new(4, 1);
        let narrow = F32ToF16Filter::new(4, 1);

        let values = [0.0f32, 0.5, -1.25, 240.0];
        let mut half_store =
            AlignedVec::from_slice(&values.map(f16::from_f32));
        let mut float_store: AlignedVec<f32> = AlignedVec::zeroed(4);
        let mut back_store: AlignedVec<f16> = AlignedVec::zeroed(4);

        let half_buf = LineBuffer::new(half_store.as_mut_ptr() as *mut u8, 8, BUFFER_MAX);
        let float_buf = LineBuffer::new(float_store.as_mut_ptr() as *mut u8, 16, BUFFER_MAX);
        let back_buf = LineBuffer::new(back_store.as_mut_ptr() as *mut u8, 8, BUFFER_MAX);

        widen.process(&[half_buf], &[float_buf], 0, 0, 4, &mut [], &mut []);
        assert_eq!(float_store.as_slice(), &values);

        narrow.process(&[float_buf], &[back_buf], 0, 0, 4, &mut [], &mut []);
        assert_eq!(back_store.as_slice(), half_store.as_slice());
    }
}
