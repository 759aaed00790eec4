//! Transfer functions (EOTF / inverse EOTF) and their selection.
//!
//! Each supported transfer lives in its own module with scalar `eotf` /
//! `inverse_eotf` (or `oetf` / `inverse_oetf` for scene-referred curves).
//! [`select_transfer`] resolves a [`TransferCharacteristics`] value plus the
//! pipeline parameters into a [`TransferFunctions`] pair of plain function
//! pointers with pre/post scales.
//!
//! # Scene vs display referred
//!
//! Display-referred decoding of BT.709 material uses the BT.1886 power law;
//! scene-referred decoding inverts the camera OETF instead. PQ and HLG work
//! in absolute light: linear values are normalized so that 1.0 equals the
//! nominal peak luminance.

pub mod arib_b67;
pub mod rec1886;
pub mod rec709;
pub mod srgb;
pub mod st2084;

use crate::error::{ColorError, ColorResult};
use vfc_core::TransferCharacteristics;

/// Luminance of PQ full scale in cd/m2.
pub const ST2084_PEAK_LUMINANCE: f64 = 10000.0;

/// Nominal peak of an HLG reference display in cd/m2.
pub const ARIB_B67_PEAK_LUMINANCE: f64 = 1000.0;

/// A resolved transfer function pair.
///
/// Decoding computes `linear = to_linear(x) * to_linear_scale`; encoding
/// computes `encoded = to_gamma(x * to_gamma_scale)`. The scales fold the
/// absolute-luminance transfers onto the pipeline's nominal peak.
#[derive(Debug, Clone, Copy)]
pub struct TransferFunctions {
    /// Decode: encoded signal to linear light.
    pub to_linear: fn(f32) -> f32,
    /// Encode: linear light to signal.
    pub to_gamma: fn(f32) -> f32,
    /// Post-scale applied after `to_linear`.
    pub to_linear_scale: f32,
    /// Pre-scale applied before `to_gamma`.
    pub to_gamma_scale: f32,
}

fn identity(x: f32) -> f32 {
    x
}

fn gamma22_eotf(v: f32) -> f32 {
    if v <= 0.0 {
        0.0
    } else {
        v.powf(2.2)
    }
}

fn gamma22_inverse_eotf(l: f32) -> f32 {
    if l <= 0.0 {
        0.0
    } else {
        l.powf(1.0 / 2.2)
    }
}

/// Resolves a transfer value into concrete functions.
///
/// `peak_luminance` is the luminance of linear 1.0 in cd/m2;
/// `scene_referred` selects camera-side curves where the standard defines
/// both directions.
pub fn select_transfer(
    transfer: TransferCharacteristics,
    peak_luminance: f64,
    scene_referred: bool,
) -> ColorResult<TransferFunctions> {
    let unity = TransferFunctions {
        to_linear: identity,
        to_gamma: identity,
        to_linear_scale: 1.0,
        to_gamma_scale: 1.0,
    };

    match transfer {
        TransferCharacteristics::Linear => Ok(unity),
        TransferCharacteristics::Bt709 => {
            if scene_referred {
                Ok(TransferFunctions {
                    to_linear: rec709::inverse_oetf,
                    to_gamma: rec709::oetf,
                    ..unity
                })
            } else {
                Ok(TransferFunctions {
                    to_linear: rec1886::eotf,
                    to_gamma: rec1886::inverse_eotf,
                    ..unity
                })
            }
        }
        TransferCharacteristics::Bt470M => Ok(TransferFunctions {
            to_linear: gamma22_eotf,
            to_gamma: gamma22_inverse_eotf,
            ..unity
        }),
        TransferCharacteristics::Srgb => Ok(TransferFunctions {
            to_linear: srgb::eotf,
            to_gamma: srgb::inverse_eotf,
            ..unity
        }),
        TransferCharacteristics::St2084 => Ok(TransferFunctions {
            to_linear: st2084::eotf,
            to_gamma: st2084::inverse_eotf,
            to_linear_scale: (ST2084_PEAK_LUMINANCE / peak_luminance) as f32,
            to_gamma_scale: (peak_luminance / ST2084_PEAK_LUMINANCE) as f32,
        }),
        TransferCharacteristics::AribB67 => {
            let scale = ARIB_B67_PEAK_LUMINANCE / peak_luminance;
            if scene_referred {
                Ok(TransferFunctions {
                    to_linear: arib_b67::inverse_oetf,
                    to_gamma: arib_b67::oetf,
                    ..unity
                })
            } else {
                Ok(TransferFunctions {
                    to_linear: arib_b67::eotf,
                    to_gamma: arib_b67::inverse_eotf,
                    to_linear_scale: scale as f32,
                    to_gamma_scale: (1.0 / scale) as f32,
                })
            }
        }
        TransferCharacteristics::Unspecified => Err(ColorError::Unsupported(
            "cannot apply gamma to unspecified transfer".into(),
        )),
    }
}
