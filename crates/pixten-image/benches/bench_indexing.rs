use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pixten_image::{Image, IndexSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn create_test_image(width: usize, height: usize) -> Image {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<u8> = (0..(width * height)).map(|_| rng.random()).collect();
    Image::from_vec(&[width, height], data).unwrap()
}

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("Views");

    for (width, height) in [(256, 224), (640, 480), (1920, 1080)].iter() {
        let image = create_test_image(*width, *height);
        let id = format!("{width}x{height}");

        group.bench_with_input(BenchmarkId::new("regular", &id), &image, |b, image| {
            b.iter(|| {
                black_box(image)
                    .at([IndexSpec::range(0, width - 1, 2), IndexSpec::All])
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("gathered", &id), &image, |b, image| {
            let mut rng = StdRng::seed_from_u64(7);
            let rows: Vec<usize> = (0..64).map(|_| rng.random_range(0..*width)).collect();
            b.iter(|| {
                black_box(image)
                    .at([IndexSpec::List(rows.clone()), IndexSpec::All])
                    .unwrap()
                    .into_image()
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("mask", &id), &image, |b, image| {
            let bits: Vec<bool> = image
                .to_vec::<u8>()
                .unwrap()
                .into_iter()
                .map(|v| v > 127)
                .collect();
            let mask = Image::from_vec(&[*width, *height], bits).unwrap();
            b.iter(|| black_box(image).at_mask(&mask).unwrap().into_image().unwrap())
        });
    }

    group.finish();
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reshape");

    let image = create_test_image(640, 480);

    group.bench_function("permute_flatten", |b| {
        b.iter(|| {
            let mut image = black_box(&image).clone();
            image.swap_axes(0, 1).unwrap().flatten().unwrap();
            image
        })
    });

    group.bench_function("copy", |b| b.iter(|| black_box(&image).copy().unwrap()));

    group.finish();
}

criterion_group!(benches, bench_views, bench_reshape);
criterion_main!(benches);
