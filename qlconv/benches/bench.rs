use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use qlconv::{
    alloc_api::encode_interleaved_to_vec, asm, convert, encode, Algorithm, BayerSize, BitDepth,
    DitherParameters, PixelBuffer,
};

const SIZES: [(u32, u32); 2] = [(256, 192), (512, 256)];

fn test_image(width: u32, height: u32) -> PixelBuffer {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        let b = ((x ^ y) & 0xFF) as u8;
        Rgba([r, g, b, 255])
    });
    PixelBuffer::new(width as usize, height as usize, image.into_raw()).unwrap()
}

fn dither(c: &mut Criterion) {
    let mut group = c.benchmark_group("dither");

    for (width, height) in SIZES {
        let source = test_image(width, height);
        let size_name = format!("{width}x{height}");

        group.throughput(criterion::Throughput::Elements(u64::from(width * height)));
        for (name, algorithm) in [
            ("threshold", Algorithm::Threshold),
            ("floyd-steinberg", Algorithm::FloydSteinberg),
            ("atkinson", Algorithm::Atkinson),
            ("ordered-8x8", Algorithm::Ordered(BayerSize::Eight)),
        ] {
            for (depth_name, depth) in [("1bit", BitDepth::One), ("2bit", BitDepth::Two)] {
                let params = DitherParameters::new(algorithm, 128, 1.0, depth);
                group.bench_with_input(
                    BenchmarkId::new(format!("{name} {depth_name}"), &size_name),
                    &source,
                    |b, source| b.iter(|| convert(source, &params)),
                );
            }
        }
    }
}

fn encoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (width, height) in SIZES {
        let quantized = convert(&test_image(width, height), &DitherParameters::default());
        let (w, h) = (width as usize, height as usize);
        let size_name = format!("{width}x{height}");

        group.throughput(criterion::Throughput::Elements(u64::from(width * height)));

        group.bench_with_input(
            BenchmarkId::new("interleaved_to_vec", &size_name),
            quantized.as_bytes(),
            |b, pixels| {
                let mut encoded = Vec::with_capacity(encode::interleaved_len(w, h, true));
                b.iter(|| {
                    encoded.clear();
                    encode_interleaved_to_vec(pixels, w, h, true, &mut encoded)
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("interleaved_std", &size_name),
            quantized.as_bytes(),
            |b, pixels| {
                let mut encoded = Vec::with_capacity(encode::interleaved_len(w, h, true));
                b.iter(|| {
                    encoded.clear();
                    encode::encode_interleaved_to_writer(pixels, w, h, true, &mut encoded)
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("planes", &size_name),
            quantized.as_bytes(),
            |b, pixels| {
                let mut encoded = vec![0; encode::planes_len(w, h, BitDepth::One)];
                b.iter(|| encode::encode_planes_to_slice(pixels, w, h, BitDepth::One, &mut encoded))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("asm", &size_name),
            quantized.as_bytes(),
            |b, pixels| b.iter(|| asm::encode_source(pixels, w, h, true)),
        );
    }
}

criterion_group!(benches, dither, encoders);
criterion_main!(benches);
