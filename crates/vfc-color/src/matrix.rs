//! Non-constant-luminance YUV<->RGB matrices.
//!
//! Every supported [`MatrixCoefficients`] value reduces to a pair of luma
//! weights `(kr, kb)`; the forward matrix follows the standard construction
//!
//! ```text
//! Y = kr*R + kg*G + kb*B          kg = 1 - kr - kb
//! U = (B - Y) / (2 * (1 - kb))
//! V = (R - Y) / (2 * (1 - kr))
//! ```
//!
//! and the inverse is the exact matrix inverse, derived in f64.

use crate::error::{ColorError, ColorResult};
use vfc_core::MatrixCoefficients;
use vfc_math::Mat3;

/// Luma weights `(kr, kb)` for a matrix value.
pub fn luma_coefficients(matrix: MatrixCoefficients) -> ColorResult<(f64, f64)> {
    match matrix {
        MatrixCoefficients::Bt709 => Ok((0.2126, 0.0722)),
        MatrixCoefficients::Fcc => Ok((0.30, 0.11)),
        MatrixCoefficients::Bt470Bg | MatrixCoefficients::Smpte170m => Ok((0.299, 0.114)),
        MatrixCoefficients::Smpte240m => Ok((0.212, 0.087)),
        MatrixCoefficients::Bt2020Ncl => Ok((0.2627, 0.0593)),
        MatrixCoefficients::Rgb | MatrixCoefficients::Unspecified => Err(
            ColorError::Unsupported(format!("no luma coefficients for {:?}", matrix)),
        ),
    }
}

/// RGB -> YUV matrix for a non-constant-luminance system.
pub fn rgb_to_yuv_matrix(matrix: MatrixCoefficients) -> ColorResult<Mat3> {
    let (kr, kb) = luma_coefficients(matrix)?;
    let kg = 1.0 - kr - kb;

    let uscale = 1.0 / (2.0 - 2.0 * kb);
    let vscale = 1.0 / (2.0 - 2.0 * kr);

    Ok(Mat3::from_rows([
        [kr, kg, kb],
        [-kr * uscale, -kg * uscale, (1.0 - kb) * uscale],
        [(1.0 - kr) * vscale, -kg * vscale, -kb * vscale],
    ]))
}

/// YUV -> RGB matrix, the exact inverse of [`rgb_to_yuv_matrix`].
pub fn yuv_to_rgb_matrix(matrix: MatrixCoefficients) -> ColorResult<Mat3> {
    rgb_to_yuv_matrix(matrix)?
        .inverse()
        .ok_or_else(|| ColorError::SingularMatrix(format!("{:?}", matrix)))
}
