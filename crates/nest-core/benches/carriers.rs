use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use nest_core::media::image::{EdgeDetector, EdgeMask, ImageCarrier};
use nest_core::media::ImageOptions;
use nest_core::positions::generate;
use nest_core::{Carrier, StegoKey};

fn carrier_image() -> RgbImage {
    RgbImage::from_fn(256, 256, |x, y| {
        Rgb([(x ^ y) as u8, (x * 3) as u8, (y * 5) as u8])
    })
}

pub fn position_generation(c: &mut Criterion) {
    let key = StegoKey::from_passphrase("SuperSecret42");

    c.bench_function("Positions 8k of 196k", |b| {
        b.iter(|| generate(&key, 256 * 256 * 3, 8 * 1024).expect("Cannot generate positions"))
    });
}

pub fn edge_detection(c: &mut Criterion) {
    let image = carrier_image();

    c.bench_function("Sobel Edge Mask", |b| {
        b.iter(|| EdgeMask::detect(&image, EdgeDetector::Sobel, 100))
    });
    c.bench_function("Local Variance Edge Mask", |b| {
        b.iter(|| EdgeMask::detect(&image, EdgeDetector::LocalVariance, 100))
    });
}

pub fn image_round_trip(c: &mut Criterion) {
    let key = StegoKey::from_passphrase("SuperSecret42");
    let secret_message = [0x42u8; 1024];
    let mut carrier = ImageCarrier::new(carrier_image(), &ImageOptions::default());

    c.bench_function("Image Encoding", |b| {
        b.iter(|| {
            carrier
                .embed(&secret_message, &key)
                .expect("Cannot write secret message")
        })
    });
    c.bench_function("Image Decoding", |b| {
        b.iter(|| {
            carrier
                .extract(&key, secret_message.len())
                .expect("Cannot read secret message")
        })
    });
}

criterion_group!(benches, position_generation, edge_detection, image_round_trip);
criterion_main!(benches);
