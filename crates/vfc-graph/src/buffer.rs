//! External image buffers bound at graph endpoints.
//!
//! The engine owns all intermediate memory; only the source and sink
//! exchange data with the caller, through an [`ImageBuffer`] of up to
//! [`MAX_PLANES`] ring-buffered plane views. A plane with mask
//! [`vfc_core::BUFFER_MAX`] holds the whole image; smaller masks describe a
//! sliding window kept filled (source) or drained (sink) by the unpack and
//! pack callbacks.

use vfc_core::{LineBuffer, MAX_PLANES};

/// Caller-supplied plane views for one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ImageBuffer {
    /// One view per plane; unused planes stay [`LineBuffer::empty`].
    pub planes: [LineBuffer; MAX_PLANES],
}

impl ImageBuffer {
    /// A buffer with all planes empty.
    pub fn new() -> Self {
        Self {
            planes: [LineBuffer::empty(); MAX_PLANES],
        }
    }

    /// Sets plane `p` to a whole-image view.
    pub fn set_plane(&mut self, p: usize, data: *mut u8, stride: isize) {
        self.planes[p] = LineBuffer::new(data, stride, vfc_core::BUFFER_MAX);
    }

    /// Sets plane `p` to a ring window of `mask + 1` lines.
    pub fn set_plane_window(&mut self, p: usize, data: *mut u8, stride: isize, mask: u32) {
        self.planes[p] = LineBuffer::new(data, stride, mask);
    }
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::new()
    }
}
