//! Color primaries and RGB<->XYZ matrix generation.
//!
//! Each supported [`ColorPrimaries`] value defines chromaticity coordinates
//! for the three primaries and the white point. The RGB->XYZ matrix is the
//! standard construction: solve the per-primary XYZ basis against the white
//! point so that RGB (1, 1, 1) maps to the white point's XYZ.

use crate::error::{ColorError, ColorResult};
use vfc_core::ColorPrimaries;
use vfc_math::{Mat3, Vec3};

/// Chromaticity coordinates of a primary set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y).
    pub r: (f64, f64),
    /// Green primary (x, y).
    pub g: (f64, f64),
    /// Blue primary (x, y).
    pub b: (f64, f64),
    /// White point (x, y).
    pub w: (f64, f64),
}

/// CIE D65 white point.
const D65: (f64, f64) = (0.3127, 0.3290);

/// CIE Illuminant C white point.
const ILLUMINANT_C: (f64, f64) = (0.310, 0.316);

/// Chromaticities for a primaries value.
pub fn primaries_of(primaries: ColorPrimaries) -> ColorResult<Primaries> {
    match primaries {
        ColorPrimaries::Bt709 => Ok(Primaries {
            r: (0.640, 0.330),
            g: (0.300, 0.600),
            b: (0.150, 0.060),
            w: D65,
        }),
        ColorPrimaries::Bt470M => Ok(Primaries {
            r: (0.670, 0.330),
            g: (0.210, 0.710),
            b: (0.140, 0.080),
            w: ILLUMINANT_C,
        }),
        ColorPrimaries::Bt470Bg => Ok(Primaries {
            r: (0.640, 0.330),
            g: (0.290, 0.600),
            b: (0.150, 0.060),
            w: D65,
        }),
        ColorPrimaries::Smpte170m => Ok(Primaries {
            r: (0.630, 0.340),
            g: (0.310, 0.595),
            b: (0.155, 0.070),
            w: D65,
        }),
        ColorPrimaries::Bt2020 => Ok(Primaries {
            r: (0.708, 0.292),
            g: (0.170, 0.797),
            b: (0.131, 0.046),
            w: D65,
        }),
        ColorPrimaries::DciP3D65 => Ok(Primaries {
            r: (0.680, 0.320),
            g: (0.265, 0.690),
            b: (0.150, 0.060),
            w: D65,
        }),
        ColorPrimaries::Unspecified => Err(ColorError::Unsupported(
            "no chromaticities for unspecified primaries".into(),
        )),
    }
}

/// Converts xy chromaticity to XYZ with Y = 1.
fn xy_to_xyz(x: f64, y: f64) -> Vec3 {
    Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
}

/// RGB -> XYZ matrix for a primary set.
pub fn rgb_to_xyz_matrix(p: &Primaries) -> ColorResult<Mat3> {
    let xr = xy_to_xyz(p.r.0, p.r.1);
    let xg = xy_to_xyz(p.g.0, p.g.1);
    let xb = xy_to_xyz(p.b.0, p.b.1);
    let white = xy_to_xyz(p.w.0, p.w.1);

    // Scale each primary column so the white point sits at RGB (1, 1, 1).
    let basis = Mat3::from_cols(xr, xg, xb);
    let s = basis
        .inverse()
        .ok_or_else(|| ColorError::SingularMatrix("degenerate primaries".into()))?
        * white;

    Ok(Mat3::from_cols(xr * s.x, xg * s.y, xb * s.z))
}

/// XYZ -> RGB matrix for a primary set.
pub fn xyz_to_rgb_matrix(p: &Primaries) -> ColorResult<Mat3> {
    rgb_to_xyz_matrix(p)?
        .inverse()
        .ok_or_else(|| ColorError::SingularMatrix("degenerate primaries".into()))
}

/// Linear-light RGB matrix converting between two primary sets.
pub fn gamut_conversion_matrix(src: ColorPrimaries, dst: ColorPrimaries) -> ColorResult<Mat3> {
    let src_p = primaries_of(src)?;
    let dst_p = primaries_of(dst)?;
    Ok(xyz_to_rgb_matrix(&dst_p)? * rgb_to_xyz_matrix(&src_p)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bt709_matches_reference() {
        // Classic sRGB/Rec.709 D65 matrix.
        let m = rgb_to_xyz_matrix(&primaries_of(ColorPrimaries::Bt709).unwrap()).unwrap();
        assert_relative_eq!(m.m[0][0], 0.4124, epsilon = 1e-3);
        assert_relative_eq!(m.m[1][0], 0.2126, epsilon = 1e-3);
        assert_relative_eq!(m.m[1][1], 0.7152, epsilon = 1e-3);
        assert_relative_eq!(m.m[2][2], 0.9505, epsilon = 1e-3);
    }

    #[test]
    fn test_white_maps_to_white() {
        for p in [
            ColorPrimaries::Bt709,
            ColorPrimaries::Bt2020,
            ColorPrimaries::Smpte170m,
            ColorPrimaries::DciP3D65,
        ] {
            let prim = primaries_of(p).unwrap();
            let m = rgb_to_xyz_matrix(&prim).unwrap();
            let white = m * Vec3::new(1.0, 1.0, 1.0);
            let expected = xy_to_xyz(prim.w.0, prim.w.1);
            assert_relative_eq!(white.x, expected.x, epsilon = 1e-10);
            assert_relative_eq!(white.y, 1.0, epsilon = 1e-10);
            assert_relative_eq!(white.z, expected.z, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_gamut_round_trip_is_identity() {
        let fwd = gamut_conversion_matrix(ColorPrimaries::Bt2020, ColorPrimaries::Bt709).unwrap();
        let bwd = gamut_conversion_matrix(ColorPrimaries::Bt709, ColorPrimaries::Bt2020).unwrap();
        let prod = fwd * bwd;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(prod.m[i][j], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_same_white_gamut_preserves_gray() {
        // BT.2020 and BT.709 share D65, so neutral gray is invariant.
        let m = gamut_conversion_matrix(ColorPrimaries::Bt2020, ColorPrimaries::Bt709).unwrap();
        let gray = m * Vec3::new(0.5, 0.5, 0.5);
        assert_relative_eq!(gray.x, 0.5, epsilon = 1e-10);
        assert_relative_eq!(gray.y, 0.5, epsilon = 1e-10);
        assert_relative_eq!(gray.z, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_unspecified_rejected() {
        assert!(primaries_of(ColorPrimaries::Unspecified).is_err());
    }
}
