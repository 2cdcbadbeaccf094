//! Benchmarks for the codec stages
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mpegflow_rs::codec::dct::{table_for_plane, transform_plane, DEFAULT_QUALITY};
use mpegflow_rs::codec::{motion, rle};

/// Smooth test plane with some texture so the RLE has work to do
fn plane(width: usize, height: usize, phase: usize) -> Vec<u8> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width + phase, i / width);
            ((x * 3 + y * 2) % 97 + (x * y) % 13) as u8
        })
        .collect()
}

fn bench_dct(c: &mut Criterion) {
    let mut group = c.benchmark_group("dct_plane");
    let table = table_for_plane(0, DEFAULT_QUALITY);

    for size in [64usize, 256, 512].iter() {
        let source = plane(*size, *size, 0);
        group.throughput(Throughput::Bytes((size * size) as u64));
        group.bench_with_input(BenchmarkId::new("forward", size), size, |b, &size| {
            b.iter(|| {
                let mut data = source.clone();
                transform_plane(&mut data, size, size, &table, false);
                black_box(data)
            });
        });
        group.bench_with_input(BenchmarkId::new("inverse", size), size, |b, &size| {
            b.iter(|| {
                let mut data = source.clone();
                transform_plane(&mut data, size, size, &table, true);
                black_box(data)
            });
        });
    }

    group.finish();
}

fn bench_motion_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion_search");

    for radius in [1u8, 4, 7].iter() {
        let (w, h) = (128, 128);
        let past = plane(w, h, 0);
        let now = plane(w, h, 2);
        group.throughput(Throughput::Elements((w / 8 * h / 8) as u64));
        group.bench_with_input(BenchmarkId::new("radius", radius), radius, |b, &radius| {
            b.iter(|| black_box(motion::estimate_vectors(&now, &past, w, h, radius)));
        });
    }

    group.finish();
}

fn bench_rle(c: &mut Criterion) {
    let mut group = c.benchmark_group("rle");
    let textured = plane(256, 256, 0);
    let sparse: Vec<u8> = (0..256 * 256).map(|i| if i % 64 == 0 { 32 } else { 0 }).collect();

    for (name, data) in [("textured", &textured), ("sparse", &sparse)] {
        let mut encoded = Vec::new();
        rle::encode(data, &mut encoded);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(BenchmarkId::new("encode", name), |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(data.len());
                rle::encode(black_box(data), &mut out);
                out
            });
        });
        group.bench_function(BenchmarkId::new("decode", name), |b| {
            b.iter(|| rle::decode(black_box(&encoded), data.len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dct, bench_motion_search, bench_rle);
criterion_main!(benches);
