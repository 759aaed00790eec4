//! Plane copy filter.
//!
//! Endpoints bind external memory, so a plane that no transform touches
//! still needs one node moving lines from the source buffer into the sink
//! buffer. The copy is a pointwise byte move.

use vfc_core::{Filter, FilterDescriptor, LineBuffer, PlaneDescriptor};

/// Pointwise plane copy.
pub struct CopyFilter {
    desc: FilterDescriptor,
}

impl CopyFilter {
    /// Creates a copy of a `width` x `height` plane of the given sample
    /// size.
    pub fn new(width: u32, height: u32, bytes_per_sample: u32) -> Self {
        let mut desc =
            FilterDescriptor::pointwise(PlaneDescriptor::new(width, height, bytes_per_sample));
        // Copying in place would be a no-op; the engine never aliases the
        // endpoints, so keep distinct buffers.
        desc.flags.in_place = false;
        Self { desc }
    }
}

impl Filter for CopyFilter {
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
        let bytes = self.desc.format.bytes_per_sample as usize;
        let (l, r) = (left as usize * bytes, right as usize * bytes);
        let src: &[u8] = unsafe { deps[0].row_slice(i, l, r) };
        let out: &mut [u8] = unsafe { dst[0].row_slice_mut(i, l, r) };
        out.copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfc_core::{AlignedVec, BUFFER_MAX};

    #[test]
    fn test_copy_row() {
        let filt = CopyFilter::new(8, 1, 2);
        let mut src: AlignedVec<u16> = AlignedVec::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut dst: AlignedVec<u16> = AlignedVec::zeroed(8);

        let src_buf = LineBuffer::new(src.as_mut_ptr() as *mut u8, 16, BUFFER_MAX);
        let dst_buf = LineBuffer::new(dst.as_mut_ptr() as *mut u8, 16, BUFFER_MAX);
        filt.process(&[src_buf], &[dst_buf], 0, 0, 8, &mut [], &mut []);

        assert_eq!(dst.as_slice(), src.as_slice());
    }
}
