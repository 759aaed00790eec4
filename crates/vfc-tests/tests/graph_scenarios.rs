//! End-to-end conversion scenarios through the graph builder.

use vfc_core::{
    AlignedVec, AlphaType, ChromaLocation, ColorFamily, ColorPrimaries, ColorRange, DitherType,
    ImageFormat, MatrixCoefficients, PixelType, TransferCharacteristics,
};
use vfc_graph::{build_field_graphs, build_filter_graph, GraphBuilderParams, GraphError};
use vfc_resize::FilterType;
use vfc_tests::TestImage;

fn run(
    graph: &vfc_graph::FilterGraph,
    src: &mut TestImage,
    dst: &mut TestImage,
) -> Result<(), GraphError> {
    let mut tmp: AlignedVec<u8> = AlignedVec::zeroed(graph.get_tmp_size());
    graph.process(&src.buffer(), &dst.buffer(), tmp.as_mut_slice(), None, None)
}

fn bt709(mut format: ImageFormat) -> ImageFormat {
    format.matrix = if format.color_family == ColorFamily::Yuv {
        MatrixCoefficients::Bt709
    } else {
        MatrixCoefficients::Rgb
    };
    format.transfer = TransferCharacteristics::Bt709;
    format.primaries = ColorPrimaries::Bt709;
    format
}

#[test]
fn test_rgb_full_to_yuv422_limited_mid_gray() {
    // Mid-gray RGB (128, 128, 128) encodes to limited-range BT.709 as
    // Y = 126, U = V = 128.
    let mut src_format = bt709(ImageFormat::new(64, 48, PixelType::U8, ColorFamily::Rgb));
    src_format.pixel_range = ColorRange::Full;

    let mut dst_format = bt709(ImageFormat::new(64, 48, PixelType::U8, ColorFamily::Yuv));
    dst_format.subsample_w = 1;
    dst_format.pixel_range = ColorRange::Limited;

    let graph =
        build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).unwrap();

    let mut src = TestImage::new(&src_format);
    for p in 0..3 {
        src.fill::<u8>(p, 128);
    }
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in [0usize, 20, 47] {
        for x in [0usize, 31, 63] {
            let luma = dst.get::<u8>(0, x, y);
            assert!((125..=127).contains(&luma), "Y {} at ({}, {})", luma, x, y);
        }
        for x in [0usize, 15, 31] {
            let u = dst.get::<u8>(1, x, y);
            let v = dst.get::<u8>(2, x, y);
            assert!((127..=129).contains(&u), "U {} at ({}, {})", u, x, y);
            assert!((127..=129).contains(&v), "V {} at ({}, {})", v, x, y);
        }
    }
}

#[test]
fn test_i420_downscale_preserves_dc() {
    let mut src_format = bt709(ImageFormat::new(192, 108, PixelType::U8, ColorFamily::Yuv));
    src_format.subsample_w = 1;
    src_format.subsample_h = 1;
    let mut dst_format = src_format;
    dst_format.width = 128;
    dst_format.height = 72;

    let params = GraphBuilderParams {
        filter: FilterType::Lanczos { taps: 3 },
        ..Default::default()
    };
    let graph = build_filter_graph(&src_format, &dst_format, &params).unwrap();

    let mut src = TestImage::new(&src_format);
    src.fill::<u8>(0, 77);
    src.fill::<u8>(1, 190);
    src.fill::<u8>(2, 40);
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in 0..72 {
        for x in 0..128 {
            assert_eq!(dst.get::<u8>(0, x, y), 77, "luma at ({}, {})", x, y);
        }
    }
    for y in 0..36 {
        for x in 0..64 {
            assert_eq!(dst.get::<u8>(1, x, y), 190);
            assert_eq!(dst.get::<u8>(2, x, y), 40);
        }
    }
}

#[test]
fn test_hdr10_to_sdr_gray() {
    // A flat PQ-coded gray decoding to 19.06% of the 100-nit SDR peak must
    // re-encode through BT.1886 near half scale.
    let mut src_format = ImageFormat::new(64, 64, PixelType::U16, ColorFamily::Yuv);
    src_format.depth = 10;
    src_format.subsample_w = 1;
    src_format.subsample_h = 1;
    src_format.matrix = MatrixCoefficients::Bt2020Ncl;
    src_format.transfer = TransferCharacteristics::St2084;
    src_format.primaries = ColorPrimaries::Bt2020;

    let mut dst_format = bt709(ImageFormat::new(64, 64, PixelType::U8, ColorFamily::Rgb));
    dst_format.pixel_range = ColorRange::Full;

    let params = GraphBuilderParams {
        dither_type: DitherType::Ordered,
        nominal_peak_luminance: 100.0,
        ..Default::default()
    };
    let graph = build_filter_graph(&src_format, &dst_format, &params).unwrap();

    // Encode the target luminance into a 10-bit limited PQ code.
    let target_linear_rel = 0.1906f32; // of the 100-nit peak
    let signal = vfc_color::transfer::st2084::inverse_eotf(target_linear_rel * 100.0 / 10000.0);
    let y_code = (64.0 + 876.0 * signal).round() as u16;
    let signal_q = (y_code as f32 - 64.0) / 876.0;
    let expected = (vfc_color::transfer::st2084::eotf(signal_q) * 100.0)
        .powf(1.0 / 2.4)
        .clamp(0.0, 1.0)
        * 255.0;

    let mut src = TestImage::new(&src_format);
    src.fill::<u16>(0, y_code);
    src.fill::<u16>(1, 512);
    src.fill::<u16>(2, 512);
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    for p in 0..3 {
        let code = dst.get::<u8>(p, 32, 32) as f32;
        assert!(
            (code - expected).abs() <= 1.5,
            "plane {}: {} vs {}",
            p,
            code,
            expected
        );
    }
    // Gray must stay neutral through the gamut conversion.
    let r = dst.get::<u8>(0, 10, 50) as i32;
    let g = dst.get::<u8>(1, 10, 50) as i32;
    let b = dst.get::<u8>(2, 10, 50) as i32;
    assert!((r - g).abs() <= 1 && (g - b).abs() <= 1, "({}, {}, {})", r, g, b);
}

#[test]
fn test_interlaced_fields_preserve_dc() {
    let mut frame_src = bt709(ImageFormat::new(64, 64, PixelType::U8, ColorFamily::Yuv));
    frame_src.subsample_w = 1;
    frame_src.subsample_h = 1;
    let mut frame_dst = frame_src;
    frame_dst.width = 32;
    frame_dst.height = 32;

    let (top, bottom) =
        build_field_graphs(&frame_src, &frame_dst, &GraphBuilderParams::default()).unwrap();

    let mut src_field = frame_src;
    src_field.height /= 2;
    let mut dst_field = frame_dst;
    dst_field.height /= 2;

    for (graph, luma) in [(&top, 60u8), (&bottom, 180u8)] {
        let mut src = TestImage::new(&src_field);
        src.fill::<u8>(0, luma);
        src.fill::<u8>(1, 128);
        src.fill::<u8>(2, 128);
        let mut dst = TestImage::new(&dst_field);
        run(graph, &mut src, &mut dst).unwrap();

        for y in 0..16 {
            for x in 0..32 {
                assert_eq!(dst.get::<u8>(0, x, y), luma);
            }
        }
        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(dst.get::<u8>(1, x, y), 128);
                assert_eq!(dst.get::<u8>(2, x, y), 128);
            }
        }
    }
}

#[test]
fn test_field_pair_runs_concurrently() {
    use vfc_graph::FieldPass;

    let mut frame_src = bt709(ImageFormat::new(32, 32, PixelType::U8, ColorFamily::Yuv));
    frame_src.subsample_w = 1;
    frame_src.subsample_h = 1;
    let frame_dst = frame_src;

    let (top, bottom) =
        build_field_graphs(&frame_src, &frame_dst, &GraphBuilderParams::default()).unwrap();

    let mut field = frame_src;
    field.height /= 2;

    let mut src_top = TestImage::new(&field);
    let mut src_bottom = TestImage::new(&field);
    src_top.fill::<u8>(0, 33);
    src_bottom.fill::<u8>(0, 99);
    for img in [&mut src_top, &mut src_bottom] {
        img.fill::<u8>(1, 128);
        img.fill::<u8>(2, 128);
    }
    let mut dst_top = TestImage::new(&field);
    let mut dst_bottom = TestImage::new(&field);

    let mut tmp_top: AlignedVec<u8> = AlignedVec::zeroed(top.get_tmp_size());
    let mut tmp_bottom: AlignedVec<u8> = AlignedVec::zeroed(bottom.get_tmp_size());

    let (src_top_buf, dst_top_buf) = (src_top.buffer(), dst_top.buffer());
    let (src_bottom_buf, dst_bottom_buf) = (src_bottom.buffer(), dst_bottom.buffer());

    vfc_graph::process_fields(
        FieldPass {
            graph: &top,
            src: &src_top_buf,
            dst: &dst_top_buf,
            tmp: tmp_top.as_mut_slice(),
            unpack: None,
            pack: None,
        },
        FieldPass {
            graph: &bottom,
            src: &src_bottom_buf,
            dst: &dst_bottom_buf,
            tmp: tmp_bottom.as_mut_slice(),
            unpack: None,
            pack: None,
        },
    )
    .unwrap();

    assert_eq!(dst_top.get::<u8>(0, 5, 5), 33);
    assert_eq!(dst_bottom.get::<u8>(0, 5, 5), 99);
}

#[test]
fn test_identity_u16_is_byte_exact() {
    let format = ImageFormat::new(64, 48, PixelType::U16, ColorFamily::Grey);
    let graph = build_filter_graph(&format, &format, &GraphBuilderParams::default()).unwrap();

    let mut src = TestImage::new(&format);
    for y in 0..48 {
        for x in 0..64 {
            src.set::<u16>(0, x, y, ((x * 1031 + y * 57) % 65536) as u16);
        }
    }
    let mut dst = TestImage::new(&format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in 0..48 {
        assert_eq!(src.row::<u16>(0, y), dst.row::<u16>(0, y), "row {}", y);
    }
}

#[test]
fn test_vertical_bilinear_buffering_is_two_lines() {
    let src_format = ImageFormat::new(16, 32, PixelType::F32, ColorFamily::Grey);
    let mut dst_format = src_format;
    dst_format.height = 64;

    let params = GraphBuilderParams {
        filter: FilterType::Bilinear,
        ..Default::default()
    };
    let graph = build_filter_graph(&src_format, &dst_format, &params).unwrap();
    assert_eq!(graph.get_input_buffering(), 2);
}

#[test]
fn test_alpha_plane_rides_along() {
    let mut src_format = bt709(ImageFormat::new(32, 32, PixelType::F32, ColorFamily::Rgb));
    src_format.alpha = AlphaType::Straight;
    let mut dst_format = src_format;
    dst_format.width = 16;
    dst_format.height = 16;

    let graph =
        build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).unwrap();

    let mut src = TestImage::new(&src_format);
    for p in 0..3 {
        src.fill::<f32>(p, 0.25);
    }
    src.fill::<f32>(3, 1.0);
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in 0..16 {
        for x in 0..16 {
            assert!((dst.get::<f32>(3, x, y) - 1.0).abs() < 1e-6);
            assert!((dst.get::<f32>(0, x, y) - 0.25).abs() < 1e-5);
        }
    }
}

#[test]
fn test_unspecified_matrix_conversion_rejected() {
    let mut src_format = ImageFormat::new(32, 32, PixelType::U8, ColorFamily::Yuv);
    src_format.transfer = TransferCharacteristics::Bt709;
    src_format.primaries = ColorPrimaries::Bt709;
    // matrix stays Unspecified
    let dst_format = bt709(ImageFormat::new(32, 32, PixelType::U8, ColorFamily::Rgb));

    let err = build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default())
        .unwrap_err();
    assert!(matches!(err, GraphError::Color(_)));
}

#[test]
fn test_alpha_mismatch_rejected() {
    let mut src_format = bt709(ImageFormat::new(32, 32, PixelType::F32, ColorFamily::Rgb));
    src_format.alpha = AlphaType::Straight;
    let dst_format = bt709(ImageFormat::new(32, 32, PixelType::F32, ColorFamily::Rgb));

    assert!(build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).is_err());
}

#[test]
fn test_chroma_relocation_changes_phase() {
    // Same dimensions, different chroma siting: the chroma planes go
    // through a phase-shift resample while luma is a plain copy.
    let mut src_format = bt709(ImageFormat::new(32, 32, PixelType::U8, ColorFamily::Yuv));
    src_format.subsample_w = 1;
    src_format.chroma_location = ChromaLocation::Left;
    let mut dst_format = src_format;
    dst_format.chroma_location = ChromaLocation::Center;

    let graph =
        build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).unwrap();

    let mut src = TestImage::new(&src_format);
    // Alternating chroma columns; a half-sample shift lands between them.
    for y in 0..32 {
        for x in 0..16 {
            src.set::<u8>(1, x, y, if x % 2 == 0 { 100 } else { 200 });
            src.set::<u8>(2, x, y, 128);
        }
        for x in 0..32 {
            src.set::<u8>(0, x, y, 50);
        }
    }
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    // Luma untouched, chroma interpolated away from the original codes.
    assert_eq!(dst.get::<u8>(0, 7, 7), 50);
    let u = dst.get::<u8>(1, 5, 7);
    assert!(u > 100 && u < 200, "U {}", u);
}

#[test]
fn test_411_to_420_flat_chroma() {
    // Horizontal ratio 2 and vertical ratio 1 both get exercised.
    let mut src_format = bt709(ImageFormat::new(64, 64, PixelType::U8, ColorFamily::Yuv));
    src_format.subsample_w = 2;
    let mut dst_format = src_format;
    dst_format.subsample_w = 1;
    dst_format.subsample_h = 1;

    let graph =
        build_filter_graph(&src_format, &dst_format, &GraphBuilderParams::default()).unwrap();

    let mut src = TestImage::new(&src_format);
    src.fill::<u8>(0, 90);
    src.fill::<u8>(1, 170);
    src.fill::<u8>(2, 70);
    let mut dst = TestImage::new(&dst_format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in 0..32 {
        for x in 0..32 {
            assert_eq!(dst.get::<u8>(1, x, y), 170);
            assert_eq!(dst.get::<u8>(2, x, y), 70);
        }
    }
    assert_eq!(dst.get::<u8>(0, 63, 63), 90);
}

#[test]
fn test_sub_pixel_shift_moves_rows() {
    // A whole-line vertical shift relabels rows: output row y samples
    // input row y + 1 in the interior.
    let format = ImageFormat::new(8, 32, PixelType::F32, ColorFamily::Grey);
    let params = GraphBuilderParams {
        filter: FilterType::Bilinear,
        shift_h: 1.0,
        ..Default::default()
    };
    let graph = build_filter_graph(&format, &format, &params).unwrap();

    let mut src = TestImage::new(&format);
    for y in 0..32 {
        for x in 0..8 {
            src.set::<f32>(0, x, y, y as f32);
        }
    }
    let mut dst = TestImage::new(&format);
    run(&graph, &mut src, &mut dst).unwrap();

    for y in 0..30 {
        let v = dst.get::<f32>(0, 3, y);
        assert!((v - (y + 1) as f32).abs() < 1e-5, "row {} got {}", y, v);
    }
}
