//! # vfc-resize
//!
//! Separable polyphase resampling for scanline image conversion.
//!
//! A resize is decomposed into at most one horizontal and one vertical pass,
//! each driven by a precomputed [`FilterContext`] of per-output-row
//! coefficients. Contexts carry both f32 and Q1.14 fixed-point tables so the
//! same context serves integer and float planes.
//!
//! # Example
//!
//! ```rust
//! use vfc_resize::{FilterType, ResizeConversion};
//! use vfc_core::{CpuClass, PixelType};
//!
//! let filters = ResizeConversion::new(PixelType::F32, 32, 1920, 1080, 1280, 720)
//!     .filter(FilterType::Lanczos { taps: 3 })
//!     .cpu(CpuClass::Auto)
//!     .create()
//!     .unwrap();
//! assert_eq!(filters.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod filter;
pub mod horizontal;
pub mod vertical;

pub use context::{compute_filter, FilterContext, FIXED_ONE};
pub use error::{ResizeError, ResizeResult};
pub use filter::FilterType;
pub use horizontal::ResizeFilterH;
pub use vertical::ResizeFilterV;

use std::sync::Arc;
use tracing::debug;
use vfc_core::{CpuClass, Filter, PixelType};

/// Factory for the filters of one 2-D resize.
///
/// Emits zero, one, or two filters depending on which axes actually change,
/// ordering the passes to minimize multiply-accumulate work.
#[derive(Debug, Clone)]
pub struct ResizeConversion {
    pixel_type: PixelType,
    depth: u32,
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    filter: FilterType,
    shift_w: f64,
    shift_h: f64,
    subwidth: f64,
    subheight: f64,
    cpu: CpuClass,
}

impl ResizeConversion {
    /// Starts a conversion description with zero shifts and the full source
    /// as the active region.
    pub fn new(
        pixel_type: PixelType,
        depth: u32,
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    ) -> Self {
        Self {
            pixel_type,
            depth,
            src_width,
            src_height,
            dst_width,
            dst_height,
            filter: FilterType::default(),
            shift_w: 0.0,
            shift_h: 0.0,
            subwidth: src_width as f64,
            subheight: src_height as f64,
            cpu: CpuClass::Auto,
        }
    }

    /// Sets the filter function.
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Shifts the sampling grid left/up by sub-pixel amounts.
    pub fn shift(mut self, shift_w: f64, shift_h: f64) -> Self {
        self.shift_w = shift_w;
        self.shift_h = shift_h;
        self
    }

    /// Overrides the active source extent (sub-pixel crop).
    pub fn active_region(mut self, subwidth: f64, subheight: f64) -> Self {
        self.subwidth = subwidth;
        self.subheight = subheight;
        self
    }

    /// Sets the CPU class for kernel selection.
    pub fn cpu(mut self, cpu: CpuClass) -> Self {
        self.cpu = cpu;
        self
    }

    fn width_is_noop(&self) -> bool {
        self.src_width == self.dst_width
            && self.shift_w == 0.0
            && self.subwidth == self.src_width as f64
    }

    fn height_is_noop(&self) -> bool {
        self.src_height == self.dst_height
            && self.shift_h == 0.0
            && self.subheight == self.src_height as f64
    }

    /// Builds the filter sequence.
    ///
    /// Returns an empty vector when both axes are no-ops.
    pub fn create(self) -> ResizeResult<Vec<Arc<dyn Filter>>> {
        if self.pixel_type == PixelType::U8 {
            return Err(ResizeError::InvalidDimensions(
                "8-bit planes must be widened to 16 bits before resampling".into(),
            ));
        }

        let do_w = !self.width_is_noop();
        let do_h = !self.height_is_noop();

        let mut filters: Vec<Arc<dyn Filter>> = Vec::new();
        if !do_w && !do_h {
            return Ok(filters);
        }

        let h_ctx = if do_w {
            Some(Arc::new(compute_filter(
                self.filter,
                self.src_width,
                self.dst_width,
                self.shift_w,
                self.subwidth,
            )?))
        } else {
            None
        };
        let v_ctx = if do_h {
            Some(Arc::new(compute_filter(
                self.filter,
                self.src_height,
                self.dst_height,
                self.shift_h,
                self.subheight,
            )?))
        } else {
            None
        };

        let horizontal_first = match (&h_ctx, &v_ctx) {
            (Some(h), Some(v)) => {
                // Tap cost of each ordering, in multiply-accumulates.
                let h_first = self.dst_width as u64 * self.src_height as u64
                    * h.filter_width as u64
                    + self.dst_width as u64 * self.dst_height as u64 * v.filter_width as u64;
                let v_first = self.src_width as u64 * self.dst_height as u64
                    * v.filter_width as u64
                    + self.dst_width as u64 * self.dst_height as u64 * h.filter_width as u64;
                h_first <= v_first
            }
            _ => true,
        };

        debug!(
            filter = self.filter.name(),
            src_w = self.src_width,
            src_h = self.src_height,
            dst_w = self.dst_width,
            dst_h = self.dst_height,
            horizontal_first,
            "building resize"
        );

        if horizontal_first {
            if let Some(h) = h_ctx {
                filters.push(Arc::new(ResizeFilterH::new(
                    h,
                    self.pixel_type,
                    self.depth,
                    self.src_height,
                    self.cpu,
                )));
            }
            if let Some(v) = v_ctx {
                filters.push(Arc::new(ResizeFilterV::new(
                    v,
                    self.pixel_type,
                    self.depth,
                    self.dst_width,
                    self.cpu,
                )));
            }
        } else {
            if let Some(v) = v_ctx {
                filters.push(Arc::new(ResizeFilterV::new(
                    v,
                    self.pixel_type,
                    self.depth,
                    self.src_width,
                    self.cpu,
                )));
            }
            if let Some(h) = h_ctx {
                filters.push(Arc::new(ResizeFilterH::new(
                    h,
                    self.pixel_type,
                    self.depth,
                    self.dst_height,
                    self.cpu,
                )));
            }
        }

        Ok(filters)
    }
}
