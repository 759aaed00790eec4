//! # vfc-depth
//!
//! Bit-depth and numeric-format conversion kernels.
//!
//! Conversions between the four sample representations are built from four
//! pointwise families plus one stateful one:
//!
//! - integer widening by left shift ([`LeftShiftFilter`])
//! - integer to float normalization ([`ConvertToFloatFilter`])
//! - half/single float conversion ([`F16ToF32Filter`], [`F32ToF16Filter`])
//! - rounding / ordered-dither quantization ([`DitherFilter`])
//! - Floyd-Steinberg error diffusion ([`ErrorDiffusionFilter`])
//!
//! [`DepthConversion`] picks the right family for a format pair.
//!
//! # Example
//!
//! ```rust
//! use vfc_depth::DepthConversion;
//! use vfc_core::{Filter, PixelFormat, PixelType};
//!
//! let src = PixelFormat::new(PixelType::U8);
//! let dst = PixelFormat { depth: 10, ..PixelFormat::new(PixelType::U16) };
//! let filt = DepthConversion::new(src, dst, 640, 480)
//!     .create()
//!     .unwrap()
//!     .expect("not a no-op");
//! assert_eq!(filt.descriptor().format.bytes_per_sample, 2);
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod diffusion;
pub mod dither;
pub mod error;
pub mod f16c;

pub use convert::{
    from_float_scale_offset, to_float_scale_offset, ConvertToFloatFilter, LeftShiftFilter,
};
pub use diffusion::ErrorDiffusionFilter;
pub use dither::{DitherFilter, QuantizeMode};
pub use error::{DepthError, DepthResult};
pub use f16c::{F16ToF32Filter, F32ToF16Filter};

use std::sync::Arc;
use vfc_core::{CpuClass, DitherType, Filter, PixelFormat, PixelType};

/// Factory for the single filter converting one plane between two formats.
#[derive(Debug, Clone)]
pub struct DepthConversion {
    src: PixelFormat,
    dst: PixelFormat,
    width: u32,
    height: u32,
    dither: DitherType,
    cpu: CpuClass,
}

impl DepthConversion {
    /// Starts a conversion description with no dithering.
    pub fn new(src: PixelFormat, dst: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            src,
            dst,
            width,
            height,
            dither: DitherType::None,
            cpu: CpuClass::Auto,
        }
    }

    /// Sets the dithering mode for integer targets.
    pub fn dither(mut self, dither: DitherType) -> Self {
        self.dither = dither;
        self
    }

    /// Sets the CPU class for kernel selection.
    pub fn cpu(mut self, cpu: CpuClass) -> Self {
        self.cpu = cpu;
        self
    }

    /// Whether a limited-range integer pair converts exactly by left shift.
    fn shift_applies(&self) -> bool {
        !self.src.pixel_type.is_float()
            && !self.dst.pixel_type.is_float()
            && self.src.fullrange == self.dst.fullrange
            && self.src.chroma == self.dst.chroma
            && self.dst.depth >= self.src.depth
            && (!self.src.fullrange || self.dst.depth == self.src.depth)
    }

    /// Builds the conversion filter, or `None` when the formats already
    /// match.
    pub fn create(self) -> DepthResult<Option<Arc<dyn Filter>>> {
        let (src, dst) = (self.src, self.dst);

        if src == dst {
            return Ok(None);
        }
        if !src.pixel_type.is_float() && (src.depth == 0 || src.depth > 16) {
            return Err(DepthError::InvalidFormat(format!(
                "source depth {} out of range",
                src.depth
            )));
        }
        if !dst.pixel_type.is_float() && (dst.depth == 0 || dst.depth > 16) {
            return Err(DepthError::InvalidFormat(format!(
                "target depth {} out of range",
                dst.depth
            )));
        }

        let filt: Arc<dyn Filter> = match (src.pixel_type.is_float(), dst.pixel_type.is_float()) {
            // Float-to-float is a representation change only.
            (true, true) => match (src.pixel_type, dst.pixel_type) {
                (PixelType::F16, PixelType::F32) => {
                    Arc::new(F16ToF32Filter::new(self.width, self.height))
                }
                (PixelType::F32, PixelType::F16) => {
                    Arc::new(F32ToF16Filter::new(self.width, self.height))
                }
                _ => return Ok(None),
            },
            (false, true) => Arc::new(ConvertToFloatFilter::new(
                &src,
                dst.pixel_type,
                self.width,
                self.height,
                self.cpu,
            )),
            (false, false) if self.shift_applies() => Arc::new(LeftShiftFilter::new(
                src.pixel_type,
                dst.pixel_type,
                dst.depth - src.depth,
                self.width,
                self.height,
            )),
            // Anything else quantizes through float.
            _ => match self.dither {
                DitherType::ErrorDiffusion => Arc::new(ErrorDiffusionFilter::new(
                    &src,
                    &dst,
                    self.width,
                    self.height,
                )),
                DitherType::Ordered => Arc::new(DitherFilter::new(
                    &src,
                    &dst,
                    QuantizeMode::Ordered,
                    self.width,
                    self.height,
                    self.cpu,
                )),
                DitherType::None => Arc::new(DitherFilter::new(
                    &src,
                    &dst,
                    QuantizeMode::Round,
                    self.width,
                    self.height,
                    self.cpu,
                )),
            },
        };

        Ok(Some(filt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pixel_type: PixelType, depth: u32, fullrange: bool) -> PixelFormat {
        PixelFormat {
            pixel_type,
            depth,
            fullrange,
            chroma: false,
        }
    }

    #[test]
    fn test_identity_is_none() {
        let f = fmt(PixelType::U16, 16, false);
        assert!(DepthConversion::new(f, f, 64, 64).create().unwrap().is_none());
    }

    #[test]
    fn test_limited_widen_uses_shift() {
        let filt = DepthConversion::new(
            fmt(PixelType::U8, 8, false),
            fmt(PixelType::U16, 10, false),
            64,
            64,
        )
        .create()
        .unwrap()
        .unwrap();
        // Left shift is exact; the descriptor allows in-place only for
        // same-size containers, so 8 -> 16 bit must copy.
        assert!(!filt.descriptor().flags.in_place);
        assert_eq!(filt.descriptor().format.bytes_per_sample, 2);
    }

    #[test]
    fn test_full_range_widen_goes_through_float() {
        // 255 must map to 1023, which a shift cannot produce.
        let filt = DepthConversion::new(
            fmt(PixelType::U8, 8, true),
            fmt(PixelType::U16, 10, true),
            64,
            64,
        )
        .create()
        .unwrap()
        .unwrap();
        assert!(!filt.descriptor().flags.entire_row);
        assert_eq!(filt.descriptor().step, 1);
    }

    #[test]
    fn test_error_diffusion_selected() {
        let filt = DepthConversion::new(
            fmt(PixelType::F32, 32, true),
            fmt(PixelType::U8, 8, true),
            64,
            64,
        )
        .dither(DitherType::ErrorDiffusion)
        .create()
        .unwrap()
        .unwrap();
        assert!(filt.descriptor().flags.entire_row);
    }

    #[test]
    fn test_rejects_bad_depth() {
        assert!(DepthConversion::new(
            fmt(PixelType::U16, 17, false),
            fmt(PixelType::U8, 8, false),
            4,
            4
        )
        .create()
        .is_err());
    }
}
