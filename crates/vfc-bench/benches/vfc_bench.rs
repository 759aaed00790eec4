//! Benchmarks for the hot line kernels.
//!
//! Run with: `cargo bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vfc_color::transfer::{rec1886, srgb, st2084};
use vfc_color::{gamma_approx, Operation};
use vfc_core::{AlignedVec, CpuClass, Filter, KernelTier, LineBuffer, PixelType, BUFFER_MAX};
use vfc_resize::{compute_filter, FilterType, ResizeFilterH};

/// Benchmark transfer function evaluation, exact vs approximate.
fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");

    let n = 100_000usize;
    let values: Vec<f32> = (0..n).map(|i| i as f32 / n as f32).collect();
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("rec1886_eotf_exact", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&x| rec1886::eotf(black_box(x)))
                .sum::<f32>()
        })
    });
    group.bench_function("rec1886_eotf_approx", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&x| gamma_approx::rec1886_eotf(black_box(x)))
                .sum::<f32>()
        })
    });
    group.bench_function("srgb_eotf_exact", |b| {
        b.iter(|| values.iter().map(|&x| srgb::eotf(black_box(x))).sum::<f32>())
    });
    group.bench_function("st2084_eotf", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|&x| st2084::eotf(black_box(x)))
                .sum::<f32>()
        })
    });

    group.finish();
}

/// Benchmark the horizontal U16 resampler across CPU tiers.
fn bench_resize_h(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize_h_u16");

    for (src_w, dst_w) in [(1920u32, 1280u32), (1280, 1920)] {
        let ctx = Arc::new(
            compute_filter(FilterType::Lanczos { taps: 3 }, src_w, dst_w, 0.0, src_w as f64)
                .unwrap(),
        );
        let mut src: AlignedVec<u16> =
            AlignedVec::from_slice(&(0..src_w).map(|i| (i * 31) as u16).collect::<Vec<_>>());
        let mut dst: AlignedVec<u16> = AlignedVec::zeroed(dst_w as usize);
        let src_buf =
            LineBuffer::new(src.as_mut_ptr() as *mut u8, src_w as isize * 2, BUFFER_MAX);
        let dst_buf =
            LineBuffer::new(dst.as_mut_ptr() as *mut u8, dst_w as isize * 2, BUFFER_MAX);

        group.throughput(Throughput::Elements(dst_w as u64));
        for cpu in [CpuClass::None, CpuClass::Auto] {
            let filt = ResizeFilterH::new(ctx.clone(), PixelType::U16, 16, 1, cpu);
            let label = match cpu {
                CpuClass::None => "scalar",
                _ => "vector",
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{}to{}_{}", src_w, dst_w, label), dst_w),
                &dst_w,
                |b, &w| {
                    b.iter(|| {
                        filt.process(
                            &[src_buf],
                            &[dst_buf],
                            0,
                            0,
                            black_box(w),
                            &mut [],
                            &mut [],
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the 3x3 matrix row operation.
fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("colorspace_matrix");

    let n = 1920usize;
    let m = [[0.2126f32, 0.7152, 0.0722], [-0.1146, -0.3854, 0.5], [0.5, -0.4542, -0.0458]];
    let op = Operation::Matrix(m);

    let mut r = vec![0.5f32; n];
    let mut g = vec![0.4f32; n];
    let mut b = vec![0.3f32; n];

    group.throughput(Throughput::Elements(n as u64));
    for tier in [KernelTier::Scalar, KernelTier::Vector] {
        let label = match tier {
            KernelTier::Scalar => "scalar",
            KernelTier::Vector => "vector",
        };
        group.bench_function(label, |bench| {
            bench.iter(|| op.apply(black_box(&mut r), &mut g, &mut b, tier))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transfer, bench_resize_h, bench_matrix);
criterion_main!(benches);
