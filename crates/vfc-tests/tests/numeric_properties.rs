//! Cross-crate numeric properties: round-trip laws and scalar/approximate
//! kernel agreement.

use vfc_core::{ColorPrimaries, CpuClass, KernelTier, MatrixCoefficients, TransferCharacteristics};
use vfc_color::{make_plan, ColorspaceDefinition, Operation, PlanParams};
use vfc_depth::{from_float_scale_offset, to_float_scale_offset};
use vfc_tests::psnr;

fn ramp(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 / (n - 1) as f32).collect()
}

fn apply_plan(ops: &[Operation], r: &mut [f32], g: &mut [f32], b: &mut [f32]) {
    for op in ops {
        op.apply(r, g, b, KernelTier::Scalar);
    }
}

#[test]
fn test_approximate_gamma_psnr_above_80db() {
    // The fast gamma path must stay within 80 dB of the exact one.
    let srgb = ColorspaceDefinition {
        matrix: MatrixCoefficients::Rgb,
        transfer: TransferCharacteristics::Srgb,
        primaries: ColorPrimaries::Bt709,
    };
    let linear = ColorspaceDefinition {
        matrix: MatrixCoefficients::Rgb,
        transfer: TransferCharacteristics::Linear,
        primaries: ColorPrimaries::Bt709,
    };

    let exact_ops = make_plan(&srgb, &linear, &PlanParams::default()).unwrap();
    let approx_ops = make_plan(
        &srgb,
        &linear,
        &PlanParams {
            approximate_gamma: true,
            ..Default::default()
        },
    )
    .unwrap();

    let n = 4096;
    let (mut r1, mut g1, mut b1) = (ramp(n), ramp(n), ramp(n));
    let (mut r2, mut g2, mut b2) = (ramp(n), ramp(n), ramp(n));
    apply_plan(&exact_ops, &mut r1, &mut g1, &mut b1);
    apply_plan(&approx_ops, &mut r2, &mut g2, &mut b2);

    let db = psnr(&r1, &r2);
    assert!(db >= 80.0, "psnr {}", db);
}

#[test]
fn test_colorspace_round_trip_psnr() {
    // YUV -> RGB linear BT.2020 -> back, on mid-range values.
    let a = ColorspaceDefinition {
        matrix: MatrixCoefficients::Bt709,
        transfer: TransferCharacteristics::Bt709,
        primaries: ColorPrimaries::Bt709,
    };
    let b = ColorspaceDefinition {
        matrix: MatrixCoefficients::Bt2020Ncl,
        transfer: TransferCharacteristics::Linear,
        primaries: ColorPrimaries::Bt2020,
    };

    let forward = make_plan(&a, &b, &PlanParams::default()).unwrap();
    let backward = make_plan(&b, &a, &PlanParams::default()).unwrap();

    // Chroma small enough that the derived RGB stays inside (0, 1), where
    // the gamma pair is exactly invertible.
    let n = 512;
    let y0: Vec<f32> = (0..n).map(|i| 0.3 + 0.5 * i as f32 / n as f32).collect();
    let u0 = vec![0.02f32; n];
    let v0 = vec![-0.01f32; n];

    let (mut y, mut u, mut v) = (y0.clone(), u0.clone(), v0.clone());
    apply_plan(&forward, &mut y, &mut u, &mut v);
    apply_plan(&backward, &mut y, &mut u, &mut v);

    assert!(psnr(&y, &y0) > 80.0);
    assert!(psnr(&u, &u0) > 80.0);
    assert!(psnr(&v, &v0) > 80.0);
}

#[test]
fn test_depth_normalization_round_trip() {
    // to-float then from-float is the identity on every code value.
    for (depth, fullrange, chroma) in [
        (8u32, false, false),
        (8, true, false),
        (10, false, true),
        (16, true, false),
    ] {
        let fmt = vfc_core::PixelFormat {
            pixel_type: vfc_core::PixelType::U16,
            depth,
            fullrange,
            chroma,
        };
        let (s, o) = to_float_scale_offset(&fmt);
        let (si, oi) = from_float_scale_offset(&fmt);
        for code in (0..(1u32 << depth)).step_by(7) {
            let norm = code as f32 * s + o;
            let back = (norm * si + oi).round();
            assert_eq!(back as u32, code, "depth {} code {}", depth, code);
        }
    }
}

#[test]
fn test_cpu_dispatch_changes_nothing_u16_resize() {
    // Kernel tiers agree bit-exactly on the fixed-point path.
    use std::sync::Arc;
    use vfc_core::{AlignedVec, LineBuffer, PixelType, BUFFER_MAX};
    use vfc_resize::{compute_filter, FilterType, ResizeFilterH};

    let ctx = Arc::new(compute_filter(FilterType::Spline36, 120, 89, 0.0, 120.0).unwrap());
    let mut outs: Vec<Vec<u16>> = Vec::new();

    for cpu in [CpuClass::None, CpuClass::Auto] {
        let filt = ResizeFilterH::new(ctx.clone(), PixelType::U16, 12, 1, cpu);
        let mut src: AlignedVec<u16> =
            AlignedVec::from_slice(&(0..120).map(|i| (i * 33) as u16).collect::<Vec<_>>());
        let mut dst: AlignedVec<u16> = AlignedVec::zeroed(89);

        let src_buf = LineBuffer::new(src.as_mut_ptr() as *mut u8, 240, BUFFER_MAX);
        let dst_buf = LineBuffer::new(dst.as_mut_ptr() as *mut u8, 178, BUFFER_MAX);
        use vfc_core::Filter;
        filt.process(&[src_buf], &[dst_buf], 0, 0, 89, &mut [], &mut []);
        outs.push(dst.as_slice().to_vec());
    }
    assert_eq!(outs[0], outs[1]);
}
