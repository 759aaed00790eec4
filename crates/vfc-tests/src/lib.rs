//! Shared helpers for VFC-RS integration tests.

use vfc_core::numeric::ceil_n;
use vfc_core::{AlignedVec, ImageFormat, ALIGNMENT};
use vfc_graph::ImageBuffer;

/// Peak signal-to-noise ratio between two equal-length signals, in dB,
/// with a peak of 1.0.
pub fn psnr(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len());
    let mse: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum::<f64>()
        / a.len() as f64;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        -10.0 * mse.log10()
    }
}

/// Owned planar storage matching an [`ImageFormat`], with aligned rows.
pub struct TestImage {
    planes: Vec<AlignedVec<u8>>,
    strides: Vec<isize>,
    format: ImageFormat,
}

impl TestImage {
    /// Allocates zeroed planes for a format.
    pub fn new(format: &ImageFormat) -> Self {
        let mut planes = Vec::new();
        let mut strides = Vec::new();
        for p in 0..format.num_planes() {
            let width = if format.is_alpha_plane(p) {
                format.width
            } else {
                format.plane_width(p)
            };
            let height = if format.is_alpha_plane(p) {
                format.height
            } else {
                format.plane_height(p)
            };
            let stride = ceil_n(width as usize * format.pixel_type.size_of(), ALIGNMENT);
            planes.push(AlignedVec::zeroed(stride * height as usize));
            strides.push(stride as isize);
        }
        Self {
            planes,
            strides,
            format: *format,
        }
    }

    /// Whole-image buffer view over all planes.
    pub fn buffer(&mut self) -> ImageBuffer {
        let mut buf = ImageBuffer::new();
        for (p, plane) in self.planes.iter_mut().enumerate() {
            let stride = self.strides[p];
            buf.set_plane(p, plane.as_mut_ptr(), stride);
        }
        buf
    }

    /// Fills every sample of plane `p` with a raw value.
    pub fn fill<T: Copy>(&mut self, p: usize, value: T) {
        let bytes = std::mem::size_of::<T>();
        assert_eq!(bytes, self.format.pixel_type.size_of());
        let plane = &mut self.planes[p];
        let n = plane.len() / bytes;
        let ptr = plane.as_mut_ptr() as *mut T;
        for i in 0..n {
            unsafe { ptr.add(i).write(value) };
        }
    }

    /// Sample at `(x, y)` of plane `p`.
    pub fn get<T: Copy>(&self, p: usize, x: usize, y: usize) -> T {
        let ptr = unsafe {
            (self.planes[p].as_ptr() as *const u8).offset(self.strides[p] * y as isize)
        } as *const T;
        unsafe { ptr.add(x).read() }
    }

    /// Writes the sample at `(x, y)` of plane `p`.
    pub fn set<T: Copy>(&mut self, p: usize, x: usize, y: usize, value: T) {
        let stride = self.strides[p];
        let ptr = unsafe { self.planes[p].as_mut_ptr().offset(stride * y as isize) } as *mut T;
        unsafe { ptr.add(x).write(value) };
    }

    /// Row `y` of plane `p` as typed samples.
    pub fn row<T: Copy>(&self, p: usize, y: usize) -> Vec<T> {
        let width = if self.format.is_alpha_plane(p as u32) {
            self.format.width
        } else {
            self.format.plane_width(p as u32)
        } as usize;
        (0..width).map(|x| self.get::<T>(p, x, y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfc_core::{ColorFamily, PixelType};

    #[test]
    fn test_psnr_of_identical_is_infinite() {
        let a = [0.1f32, 0.5, 0.9];
        assert!(psnr(&a, &a).is_infinite());
    }

    #[test]
    fn test_image_round_trips_samples() {
        let fmt = ImageFormat::new(8, 4, PixelType::U16, ColorFamily::Grey);
        let mut img = TestImage::new(&fmt);
        img.set::<u16>(0, 3, 2, 777);
        assert_eq!(img.get::<u16>(0, 3, 2), 777);
        assert_eq!(img.get::<u16>(0, 0, 0), 0);
    }
}
