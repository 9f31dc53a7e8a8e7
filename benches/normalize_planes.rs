use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use rw2exr_rs::image_pipeline::{DecodedImage, LinearImageBuffer};

fn generate_mock_rgb16(width: usize, height: usize) -> DecodedImage {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let value = (((x + y) * 257) % 65536) as u16;
            data.extend_from_slice(&[value, value / 2, value / 3]);
        }
    }
    DecodedImage {
        width,
        height,
        data,
        bits_per_sample: 16,
    }
}

fn benchmark_split_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("rgb16_to_planes");

    let sizes = vec![
        (100, 100, "100x100"),
        (1000, 1000, "1000x1000"),
        (5184, 3888, "20mp"),
    ];

    for (width, height, label) in sizes {
        let image = generate_mock_rgb16(width, height);

        group.bench_with_input(BenchmarkId::from_parameter(label), &image, |b, image| {
            b.iter(|| LinearImageBuffer::from_rgb16(black_box(image)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_split_by_size);
criterion_main!(benches);
