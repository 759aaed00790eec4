//! Colorspace conversion plan synthesis.
//!
//! Given two (matrix, transfer, primaries) triples, emit the shortest
//! operation list that converts between them:
//!
//! - matrices that differ route through RGB (inverse YUV matrix, then a
//!   forward one)
//! - primaries that differ route through linear light (inverse EOTF, 3x3
//!   gamut matrix, EOTF)
//! - consecutive matrices fuse by multiplying the f64 forms offline
//! - unspecified colorimetry on any leg that is actually exercised is an
//!   error

use std::sync::Arc;

use tracing::debug;
use vfc_core::{MatrixCoefficients, TransferCharacteristics};
use vfc_math::Mat3;

use crate::error::ColorResult;
use crate::gamma_approx;
use crate::lut::HalfLut;
use crate::matrix::{rgb_to_yuv_matrix, yuv_to_rgb_matrix};
use crate::operation::{GammaEval, GammaOperation, Operation};
use crate::primaries::gamut_conversion_matrix;
use crate::transfer::{select_transfer, ST2084_PEAK_LUMINANCE};

/// One endpoint of a colorspace conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorspaceDefinition {
    /// YUV<->RGB matrix.
    pub matrix: MatrixCoefficients,
    /// Transfer characteristics.
    pub transfer: TransferCharacteristics,
    /// Color primaries.
    pub primaries: vfc_core::ColorPrimaries,
}

/// Tuning parameters for plan synthesis.
#[derive(Debug, Clone, Copy)]
pub struct PlanParams {
    /// Luminance of linear 1.0 in cd/m2.
    pub peak_luminance: f64,
    /// Allow polynomial / tabulated gamma in place of exact `powf`.
    pub approximate_gamma: bool,
    /// Use camera-side (scene-referred) curves where defined.
    pub scene_referred: bool,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            peak_luminance: 100.0,
            approximate_gamma: false,
            scene_referred: false,
        }
    }
}

/// Intermediate plan step; matrices stay in f64 until fusion is done.
enum PlanStep {
    Matrix(Mat3),
    Gamma(GammaOperation),
}

/// Picks the gamma evaluation strategy for one direction of one transfer.
fn select_eval(
    transfer: TransferCharacteristics,
    params: &PlanParams,
    to_linear: bool,
    exact: fn(f32) -> f32,
) -> GammaEval {
    if !params.approximate_gamma {
        return GammaEval::Fn(exact);
    }

    match transfer {
        TransferCharacteristics::Bt709 if !params.scene_referred => GammaEval::Fn(if to_linear {
            gamma_approx::rec1886_eotf
        } else {
            gamma_approx::rec1886_inverse_eotf
        }),
        TransferCharacteristics::Srgb => GammaEval::Fn(if to_linear {
            gamma_approx::srgb_eotf
        } else {
            gamma_approx::srgb_inverse_eotf
        }),
        // PQ at a non-reference peak is ambiguous between scene and display
        // interpretations; keep the exact path rather than guess.
        TransferCharacteristics::St2084
            if params.peak_luminance == ST2084_PEAK_LUMINANCE =>
        {
            GammaEval::Lut(Arc::new(HalfLut::new(exact)))
        }
        TransferCharacteristics::AribB67 => GammaEval::Lut(Arc::new(HalfLut::new(exact))),
        _ => GammaEval::Fn(exact),
    }
}

/// Synthesizes the operation list for one conversion.
///
/// Returns an empty list when the endpoints are identical.
pub fn make_plan(
    input: &ColorspaceDefinition,
    output: &ColorspaceDefinition,
    params: &PlanParams,
) -> ColorResult<Vec<Operation>> {
    if input == output {
        return Ok(Vec::new());
    }

    let mut steps: Vec<PlanStep> = Vec::new();

    // Leave the source matrix space.
    if input.matrix != MatrixCoefficients::Rgb {
        steps.push(PlanStep::Matrix(yuv_to_rgb_matrix(input.matrix)?));
    }

    // Route through linear light when the light encoding changes.
    let needs_linear =
        input.transfer != output.transfer || input.primaries != output.primaries;
    if needs_linear {
        if input.transfer != TransferCharacteristics::Linear {
            let tf = select_transfer(input.transfer, params.peak_luminance, params.scene_referred)?;
            steps.push(PlanStep::Gamma(GammaOperation {
                eval: select_eval(input.transfer, params, true, tf.to_linear),
                prescale: 1.0,
                postscale: tf.to_linear_scale,
            }));
        }
        if input.primaries != output.primaries {
            steps.push(PlanStep::Matrix(gamut_conversion_matrix(
                input.primaries,
                output.primaries,
            )?));
        }
        if output.transfer != TransferCharacteristics::Linear {
            let tf =
                select_transfer(output.transfer, params.peak_luminance, params.scene_referred)?;
            steps.push(PlanStep::Gamma(GammaOperation {
                eval: select_eval(output.transfer, params, false, tf.to_gamma),
                prescale: tf.to_gamma_scale,
                postscale: 1.0,
            }));
        }
    }

    // Enter the target matrix space.
    if output.matrix != MatrixCoefficients::Rgb {
        steps.push(PlanStep::Matrix(rgb_to_yuv_matrix(output.matrix)?));
    }

    // Fuse adjacent matrices: applying M1 then M2 equals applying M2*M1.
    let mut fused: Vec<PlanStep> = Vec::new();
    for step in steps {
        if let PlanStep::Matrix(m) = &step {
            if let Some(PlanStep::Matrix(prev)) = fused.last_mut() {
                *prev = *m * *prev;
                continue;
            }
        }
        fused.push(step);
    }

    let ops: Vec<Operation> = fused
        .into_iter()
        .map(|step| match step {
            PlanStep::Matrix(m) => Operation::Matrix(m.to_f32()),
            PlanStep::Gamma(g) => Operation::Gamma(g),
        })
        .collect();

    debug!(
        num_ops = ops.len(),
        in_matrix = ?input.matrix,
        out_matrix = ?output.matrix,
        "synthesized colorspace plan"
    );

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfc_core::ColorPrimaries;

    fn csp(
        matrix: MatrixCoefficients,
        transfer: TransferCharacteristics,
        primaries: ColorPrimaries,
    ) -> ColorspaceDefinition {
        ColorspaceDefinition {
            matrix,
            transfer,
            primaries,
        }
    }

    #[test]
    fn test_identity_is_empty() {
        let a = csp(
            MatrixCoefficients::Bt709,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        assert!(make_plan(&a, &a, &PlanParams::default()).unwrap().is_empty());
    }

    #[test]
    fn test_matrix_only_change_fuses_to_one_op() {
        // YUV(601) -> YUV(709) with same gamma/primaries: inverse matrix
        // then forward matrix, fused into a single 3x3.
        let a = csp(
            MatrixCoefficients::Smpte170m,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        let b = csp(
            MatrixCoefficients::Bt709,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        let ops = make_plan(&a, &b, &PlanParams::default()).unwrap();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Operation::Matrix(_)));
    }

    #[test]
    fn test_hdr_to_sdr_plan_shape() {
        // YUV PQ BT.2020 -> RGB SDR BT.709:
        // matrix, inverse PQ EOTF, gamut matrix, 709 inverse gamma.
        let a = csp(
            MatrixCoefficients::Bt2020Ncl,
            TransferCharacteristics::St2084,
            ColorPrimaries::Bt2020,
        );
        let b = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        let ops = make_plan(&a, &b, &PlanParams::default()).unwrap();
        assert_eq!(ops.len(), 4);
        assert!(matches!(ops[0], Operation::Matrix(_)));
        assert!(matches!(ops[1], Operation::Gamma(_)));
        assert!(matches!(ops[2], Operation::Matrix(_)));
        assert!(matches!(ops[3], Operation::Gamma(_)));
    }

    #[test]
    fn test_unspecified_matrix_rejected_when_used() {
        let a = csp(
            MatrixCoefficients::Unspecified,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        let b = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::Bt709,
            ColorPrimaries::Bt709,
        );
        assert!(make_plan(&a, &b, &PlanParams::default()).is_err());
    }

    #[test]
    fn test_unspecified_transfer_passes_when_unused() {
        // Matrix-only conversion never touches the transfer, so an
        // unspecified transfer is allowed as long as both sides agree.
        let a = csp(
            MatrixCoefficients::Smpte170m,
            TransferCharacteristics::Unspecified,
            ColorPrimaries::Unspecified,
        );
        let b = csp(
            MatrixCoefficients::Bt709,
            TransferCharacteristics::Unspecified,
            ColorPrimaries::Unspecified,
        );
        assert!(make_plan(&a, &b, &PlanParams::default()).is_ok());
    }

    #[test]
    fn test_approximate_gamma_selects_lut_for_pq() {
        let a = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::St2084,
            ColorPrimaries::Bt2020,
        );
        let b = csp(
            MatrixCoefficients::Rgb,
            TransferCharacteristics::Linear,
            ColorPrimaries::Bt2020,
        );
        let params = PlanParams {
            peak_luminance: 10000.0,
            approximate_gamma: true,
            scene_referred: false,
        };
        let ops = make_plan(&a, &b, &params).unwrap();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::Gamma(g) => assert!(matches!(g.eval, GammaEval::Lut(_))),
            _ => panic!("expected gamma op"),
        }
    }
}
