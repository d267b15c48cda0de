use criterion::{criterion_group, criterion_main, Criterion};
use pixten_tensor::{build_lookup, StridedLayout, TensorShape};
use std::hint::black_box;

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lookup");

    group.bench_function("symmetric_6x6_cached", |b| {
        b.iter(|| build_lookup(black_box(TensorShape::Symmetric), 6, 6).unwrap())
    });

    group.bench_function("symmetric_6x6_get", |b| {
        let lut = build_lookup(TensorShape::Symmetric, 6, 6).unwrap();
        b.iter(|| {
            let mut sum = 0;
            for row in 0..6 {
                for col in 0..6 {
                    sum += lut.get(row, col).unwrap().unwrap_or(0);
                }
            }
            black_box(sum)
        })
    });

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("Layout");

    let layout = StridedLayout::normal(&[640, 480], 3, false);

    group.bench_function("pixel_offsets_640x480", |b| {
        b.iter(|| black_box(&layout).pixel_offsets())
    });

    group.bench_function("sample_offsets_640x480", |b| {
        b.iter(|| black_box(&layout).sample_offsets(&[0, 2], 1))
    });

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_layout);
criterion_main!(benches);
