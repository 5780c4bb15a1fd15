//! Benchmarks for the Prism transform pipeline.
//!
//! Run with: cargo bench -p prism-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use prism_core::config::LimitsConfig;
use prism_core::pipeline::{self, Canvas, CanvasDecoder};
use prism_core::types::{AssetRef, CandidateImage, CropRect, CropSet, RenderOptions};
use prism_core::Trace;
use std::io::Cursor;
use std::path::Path;

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn jpeg_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .expect("encode fixture");
    buffer.into_inner()
}

fn benchmark_decode(c: &mut Criterion) {
    let bytes = jpeg_bytes(&photo(1920, 1280));
    let decoder = CanvasDecoder::new(LimitsConfig::default());

    c.bench_function("decode_jpeg_1920", |b| {
        b.iter(|| {
            let _ = decoder.decode_sync(black_box(&bytes), Path::new("bench.jpg"));
        })
    });
}

fn benchmark_resize_jpeg(c: &mut Criterion) {
    let source = photo(1920, 1280);
    let options = RenderOptions {
        resize_width: 480,
        resize_height: 320,
        quality: 50,
        ..RenderOptions::default()
    };

    c.bench_function("transform_resize_480_jpg", |b| {
        b.iter(|| {
            let canvas = Canvas::from_image(source.clone(), ImageFormat::Jpeg, "jpg");
            let _ = pipeline::transform(canvas, black_box(&options), None, &Trace::discard());
        })
    });
}

fn benchmark_crop_webp(c: &mut Criterion) {
    let source = photo(1920, 1080);
    let options = RenderOptions {
        crop: CropRect {
            width: 1080,
            height: 1080,
            x: 0,
            y: 0,
        },
        center_crop: true,
        resize_width: 256,
        ..RenderOptions::default()
    };

    c.bench_function("transform_center_crop_256_webp", |b| {
        b.iter(|| {
            let canvas = Canvas::from_image(source.clone(), ImageFormat::Jpeg, "jpg");
            let _ = pipeline::transform(
                canvas,
                black_box(&options),
                Some("image/webp"),
                &Trace::discard(),
            );
        })
    });
}

fn benchmark_variant_selection(c: &mut Criterion) {
    let candidates: Vec<CandidateImage> = (0..50u32)
        .map(|i| CandidateImage {
            assets: vec![AssetRef {
                width: 1000 + i * 17,
                height: 700 + i * 13,
                uri: format!("mgid:file:/variant-{i}.jpg"),
                format: None,
            }],
            crop_sets: (1..4u32)
                .map(|k| CropSet {
                    width: 200 * k + i,
                    height: 150 * k,
                    x: 0,
                    y: 0,
                })
                .collect(),
        })
        .collect();

    c.bench_function("select_variant_50x3", |b| {
        b.iter(|| {
            let _ = prism_core::variant::select_variant(black_box(&candidates), 640, 480);
        })
    });
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_resize_jpeg,
    benchmark_crop_webp,
    benchmark_variant_selection,
);
criterion_main!(benches);
