//! Pixel types and image format metadata.
//!
//! The engine processes planar images whose planes are described by a
//! [`PixelFormat`] (numeric representation) and whose overall layout is
//! described by an [`ImageFormat`] (dimensions, subsampling, colorimetry).
//!
//! # Types
//!
//! - [`PixelType`] - the four supported sample representations
//! - [`PixelFormat`] - representation plus depth/range/chroma metadata
//! - [`ImageFormat`] - a complete source or sink image description
//!
//! # Chroma subsampling
//!
//! Subsampling is expressed as log2 ratios per axis. A 4:2:0 image has
//! `subsample_w = 1, subsample_h = 1`; its chroma planes have dimensions
//! `width >> 1` by `height >> 1`.

use crate::error::{CoreError, CoreResult};

/// Sample representation of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit IEEE half-precision float.
    F16,
    /// 32-bit IEEE single-precision float.
    F32,
}

impl PixelType {
    /// Size of one sample in bytes.
    #[inline]
    pub const fn size_of(self) -> usize {
        match self {
            PixelType::U8 => 1,
            PixelType::U16 => 2,
            PixelType::F16 => 2,
            PixelType::F32 => 4,
        }
    }

    /// Whether the type is a floating-point representation.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, PixelType::F16 | PixelType::F32)
    }

    /// Default bit depth for the type.
    ///
    /// Integer types default to their container width; float types report
    /// their mantissa-meaningful width (16 and 32) but depth is ignored on
    /// float planes.
    #[inline]
    pub const fn default_depth(self) -> u32 {
        match self {
            PixelType::U8 => 8,
            PixelType::U16 => 16,
            PixelType::F16 => 16,
            PixelType::F32 => 32,
        }
    }
}

/// Numeric format of a single plane.
///
/// `depth` counts the meaningful low-order bits of integer samples, e.g. a
/// 10-bit plane stored in U16 has `depth = 10`. `fullrange` selects PC range
/// (`0..2^depth - 1`) over TV range (16..235 scaled by depth). `chroma` marks
/// a U/V plane whose values center on the midpoint rather than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    /// Sample representation.
    pub pixel_type: PixelType,
    /// Meaningful bits per sample (integer types only).
    pub depth: u32,
    /// PC (full) range instead of TV (limited) range.
    pub fullrange: bool,
    /// Plane holds chroma (U/V) rather than luma/RGB data.
    pub chroma: bool,
}

impl PixelFormat {
    /// Format with default depth, limited range, non-chroma.
    pub const fn new(pixel_type: PixelType) -> Self {
        Self {
            pixel_type,
            depth: pixel_type.default_depth(),
            fullrange: false,
            chroma: false,
        }
    }

    /// Largest representable integer code value, `2^depth - 1`.
    #[inline]
    pub const fn integer_peak(&self) -> u32 {
        (1u32 << self.depth) - 1
    }
}

/// Color family of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFamily {
    /// Single luma/gray plane.
    Grey,
    /// Three full-resolution R, G, B planes.
    Rgb,
    /// Y plane plus possibly-subsampled U and V planes.
    Yuv,
}

impl ColorFamily {
    /// Number of color planes (excluding alpha).
    #[inline]
    pub const fn num_planes(self) -> u32 {
        match self {
            ColorFamily::Grey => 1,
            ColorFamily::Rgb | ColorFamily::Yuv => 3,
        }
    }
}

/// Code value range of integer samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRange {
    /// TV range, e.g. 16..235 for 8-bit luma.
    Limited,
    /// PC range, 0..2^depth - 1.
    Full,
}

/// Matrix coefficients relating YUV to RGB.
///
/// Values follow ITU-T H.273. Only non-constant-luminance matrices are
/// supported; each is a plain 3x3 linear transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixCoefficients {
    /// Identity; the image is already RGB (or single-plane grey).
    Rgb,
    /// ITU-R BT.709.
    Bt709,
    /// Unknown. Conversion through this value is an error.
    Unspecified,
    /// United States FCC 73.682.
    Fcc,
    /// ITU-R BT.470 System B/G (identical coefficients to SMPTE 170M).
    Bt470Bg,
    /// SMPTE 170M / BT.601 (525-line).
    Smpte170m,
    /// SMPTE 240M.
    Smpte240m,
    /// ITU-R BT.2020 non-constant luminance.
    Bt2020Ncl,
}

/// Transfer characteristics (EOTF family) of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCharacteristics {
    /// Unknown. Gamma operations through this value are an error.
    Unspecified,
    /// Linear light.
    Linear,
    /// ITU-R BT.709 / BT.1886 display gamma.
    Bt709,
    /// ITU-R BT.470 System M (gamma 2.2).
    Bt470M,
    /// IEC 61966-2-1 sRGB.
    Srgb,
    /// SMPTE ST 2084 perceptual quantizer (PQ).
    St2084,
    /// ARIB STD-B67 hybrid log-gamma (HLG).
    AribB67,
}

/// Color primaries (gamut) of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPrimaries {
    /// Unknown. Gamut conversion through this value is an error.
    Unspecified,
    /// ITU-R BT.470 System M.
    Bt470M,
    /// ITU-R BT.470 System B/G.
    Bt470Bg,
    /// SMPTE 170M.
    Smpte170m,
    /// ITU-R BT.709 / sRGB.
    Bt709,
    /// ITU-R BT.2020.
    Bt2020,
    /// DCI-P3 with D65 white.
    DciP3D65,
}

/// Field parity for interlaced content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParity {
    /// Progressive frame.
    Progressive,
    /// Top (even-line) field.
    Top,
    /// Bottom (odd-line) field.
    Bottom,
}

/// Chroma sample siting relative to the luma grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaLocation {
    /// Horizontally co-sited with the left luma column (MPEG-2 style).
    Left,
    /// Centered between luma samples (MPEG-1 / JPEG style).
    Center,
    /// Co-sited with the top-left luma sample.
    TopLeft,
    /// Vertically co-sited with the top luma row.
    Top,
    /// Horizontally left, vertically bottom.
    BottomLeft,
    /// Vertically co-sited with the bottom luma row.
    Bottom,
}

impl ChromaLocation {
    /// Offset that moves a centered chroma sample onto the first luma
    /// sample of its group, in chroma-sample units.
    fn cosited_offset(subsample: u32) -> f64 {
        -0.5 * ((1u32 << subsample) - 1) as f64 / (1u32 << subsample) as f64
    }

    /// Horizontal chroma phase offset in chroma-sample units.
    ///
    /// Zero means the chroma sample is centered within its luma group;
    /// left-sited chroma shifts onto the left luma column (-0.25 for 4:2:0).
    pub fn offset_w(self, subsample_w: u32) -> f64 {
        if subsample_w == 0 {
            return 0.0;
        }
        match self {
            ChromaLocation::Left | ChromaLocation::TopLeft | ChromaLocation::BottomLeft => {
                Self::cosited_offset(subsample_w)
            }
            _ => 0.0,
        }
    }

    /// Vertical chroma phase offset in chroma-sample units.
    pub fn offset_h(self, subsample_h: u32) -> f64 {
        if subsample_h == 0 {
            return 0.0;
        }
        match self {
            ChromaLocation::Top | ChromaLocation::TopLeft => Self::cosited_offset(subsample_h),
            ChromaLocation::Bottom | ChromaLocation::BottomLeft => {
                -Self::cosited_offset(subsample_h)
            }
            _ => 0.0,
        }
    }
}

/// Interpretation of the alpha plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaType {
    /// No alpha plane.
    None,
    /// Straight (unassociated) alpha.
    Straight,
    /// Premultiplied (associated) alpha.
    Premultiplied,
}

/// Dithering mode for conversions that lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherType {
    /// Round to nearest only.
    None,
    /// 8x8 Bayer ordered dither.
    Ordered,
    /// Floyd-Steinberg error diffusion.
    ErrorDiffusion,
}

/// Complete description of a source or sink image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFormat {
    /// Luma (or RGB) width in pixels.
    pub width: u32,
    /// Luma (or RGB) height in pixels.
    pub height: u32,
    /// Sample representation of all planes.
    pub pixel_type: PixelType,
    /// Meaningful bits per integer sample.
    pub depth: u32,
    /// Log2 horizontal chroma subsampling ratio (0, 1, or 2).
    pub subsample_w: u32,
    /// Log2 vertical chroma subsampling ratio (0, 1, or 2).
    pub subsample_h: u32,
    /// Color family.
    pub color_family: ColorFamily,
    /// YUV<->RGB matrix.
    pub matrix: MatrixCoefficients,
    /// Transfer characteristics.
    pub transfer: TransferCharacteristics,
    /// Color primaries.
    pub primaries: ColorPrimaries,
    /// Code value range of integer samples.
    pub pixel_range: ColorRange,
    /// Field parity.
    pub field_parity: FieldParity,
    /// Chroma siting.
    pub chroma_location: ChromaLocation,
    /// Alpha plane interpretation.
    pub alpha: AlphaType,
}

impl ImageFormat {
    /// A progressive, limited-range format with default depth and no
    /// subsampling, unspecified colorimetry.
    pub fn new(width: u32, height: u32, pixel_type: PixelType, color_family: ColorFamily) -> Self {
        Self {
            width,
            height,
            pixel_type,
            depth: pixel_type.default_depth(),
            subsample_w: 0,
            subsample_h: 0,
            color_family,
            matrix: match color_family {
                ColorFamily::Yuv => MatrixCoefficients::Unspecified,
                _ => MatrixCoefficients::Rgb,
            },
            transfer: TransferCharacteristics::Unspecified,
            primaries: ColorPrimaries::Unspecified,
            pixel_range: ColorRange::Limited,
            field_parity: FieldParity::Progressive,
            chroma_location: ChromaLocation::Left,
            alpha: AlphaType::None,
        }
    }

    /// Number of planes including alpha.
    pub fn num_planes(&self) -> u32 {
        let color = self.color_family.num_planes();
        if self.alpha == AlphaType::None {
            color
        } else {
            color + 1
        }
    }

    /// Whether plane index `p` is a chroma plane.
    #[inline]
    pub fn is_chroma_plane(&self, p: u32) -> bool {
        self.color_family == ColorFamily::Yuv && (p == 1 || p == 2)
    }

    /// Whether plane index `p` is the alpha plane.
    #[inline]
    pub fn is_alpha_plane(&self, p: u32) -> bool {
        self.alpha != AlphaType::None && p == self.color_family.num_planes()
    }

    /// Width of plane `p` in samples.
    pub fn plane_width(&self, p: u32) -> u32 {
        if self.is_chroma_plane(p) {
            self.width >> self.subsample_w
        } else {
            self.width
        }
    }

    /// Height of plane `p` in lines.
    pub fn plane_height(&self, p: u32) -> u32 {
        if self.is_chroma_plane(p) {
            self.height >> self.subsample_h
        } else {
            self.height
        }
    }

    /// Numeric format of plane `p`.
    pub fn pixel_format(&self, p: u32) -> PixelFormat {
        PixelFormat {
            pixel_type: self.pixel_type,
            depth: self.depth,
            fullrange: self.pixel_range == ColorRange::Full
                || self.color_family == ColorFamily::Rgb,
            chroma: self.is_chroma_plane(p),
        }
    }

    /// Checks internal consistency of the format.
    pub fn validate(&self) -> CoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidDimensions(format!(
                "image dimensions must be positive: {}x{}",
                self.width, self.height
            )));
        }
        if self.subsample_w > 2 || self.subsample_h > 2 {
            return Err(CoreError::InvalidFormat(format!(
                "subsampling ratio out of range: {}x{}",
                self.subsample_w, self.subsample_h
            )));
        }
        if self.color_family != ColorFamily::Yuv && (self.subsample_w != 0 || self.subsample_h != 0)
        {
            return Err(CoreError::InvalidFormat(
                "subsampling requires YUV color family".into(),
            ));
        }
        if self.width % (1 << self.subsample_w) != 0 || self.height % (1 << self.subsample_h) != 0 {
            return Err(CoreError::InvalidFormat(format!(
                "dimensions {}x{} not divisible by subsampling {}x{}",
                self.width,
                self.height,
                1 << self.subsample_w,
                1 << self.subsample_h
            )));
        }
        if self.field_parity != FieldParity::Progressive && self.height % 2 != 0 {
            return Err(CoreError::InvalidFormat(
                "interlaced image height must be a multiple of 2".into(),
            ));
        }
        if !self.pixel_type.is_float()
            && (self.depth == 0 || self.depth > self.pixel_type.default_depth())
        {
            return Err(CoreError::InvalidFormat(format!(
                "depth {} invalid for {:?}",
                self.depth, self.pixel_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_type_sizes() {
        assert_eq!(PixelType::U8.size_of(), 1);
        assert_eq!(PixelType::U16.size_of(), 2);
        assert_eq!(PixelType::F16.size_of(), 2);
        assert_eq!(PixelType::F32.size_of(), 4);
        assert!(!PixelType::U16.is_float());
        assert!(PixelType::F16.is_float());
    }

    #[test]
    fn test_plane_dimensions_420() {
        let mut fmt = ImageFormat::new(1920, 1080, PixelType::U8, ColorFamily::Yuv);
        fmt.subsample_w = 1;
        fmt.subsample_h = 1;
        assert_eq!(fmt.plane_width(0), 1920);
        assert_eq!(fmt.plane_height(0), 1080);
        assert_eq!(fmt.plane_width(1), 960);
        assert_eq!(fmt.plane_height(2), 540);
        assert!(fmt.validate().is_ok());
    }

    #[test]
    fn test_alpha_plane_index() {
        let mut fmt = ImageFormat::new(640, 480, PixelType::F32, ColorFamily::Rgb);
        fmt.alpha = AlphaType::Straight;
        assert_eq!(fmt.num_planes(), 4);
        assert!(fmt.is_alpha_plane(3));
        assert!(!fmt.is_chroma_plane(1));
    }

    #[test]
    fn test_validate_rejects_odd_subsampled() {
        let mut fmt = ImageFormat::new(1919, 1080, PixelType::U8, ColorFamily::Yuv);
        fmt.subsample_w = 1;
        assert!(fmt.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_depth() {
        let mut fmt = ImageFormat::new(64, 64, PixelType::U8, ColorFamily::Grey);
        fmt.depth = 10;
        assert!(fmt.validate().is_err());
    }

    #[test]
    fn test_chroma_offsets() {
        assert_eq!(ChromaLocation::Left.offset_w(1), -0.25);
        assert_eq!(ChromaLocation::Left.offset_w(2), -0.375);
        assert_eq!(ChromaLocation::Center.offset_w(1), 0.0);
        assert_eq!(ChromaLocation::Left.offset_w(0), 0.0);
        assert_eq!(ChromaLocation::TopLeft.offset_h(1), -0.25);
        assert_eq!(ChromaLocation::Bottom.offset_h(1), 0.25);
    }
}
