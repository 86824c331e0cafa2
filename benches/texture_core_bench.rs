//! Micro-benchmarks for the two hottest per-pixel/per-texture paths: the
//! Pixel Classifier's alpha scan (§4.2) and the Format Policy's mip-count
//! formula (§4.1). Mirrors the teacher's own `criterion` dev-dependency use
//! for render-graph micro-benchmarks, scoped here to the compile core's
//! equivalent hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forge_assets::texture::classifier::classify_pixels;
use forge_assets::texture::policy::{mip_count, BlockExtent};

fn bench_classify_pixels(c: &mut Criterion) {
    let opaque: Vec<u8> = vec![255u8; 2048 * 2048];
    let mut group = c.benchmark_group("pixel_classifier");
    group.bench_function("all_opaque_2048x2048", |b| {
        b.iter(|| classify_pixels(black_box(opaque.iter().copied())));
    });

    let mixed: Vec<u8> = (0..2048 * 2048).map(|i| (i % 256) as u8).collect();
    group.bench_function("mixed_alpha_2048x2048", |b| {
        b.iter(|| classify_pixels(black_box(mixed.iter().copied())));
    });
    group.finish();
}

fn bench_mip_count(c: &mut Criterion) {
    c.bench_function("mip_count_4096x4096_bc", |b| {
        b.iter(|| mip_count(black_box(4096), black_box(4096), BlockExtent::BC, true));
    });
}

criterion_group!(benches, bench_classify_pixels, bench_mip_count);
criterion_main!(benches);
