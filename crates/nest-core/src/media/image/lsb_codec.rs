use std::io::{Seek, Write};
use std::path::Path;

use image::{ImageFormat, RgbImage};
use log::error;

use super::EdgeMask;
use crate::error::NestError;
use crate::media::{hide_data, persist_atomically, unveil_data, Carrier, ImageOptions, Persist};
use crate::result::Result;
use crate::StegoKey;

/// LSB carrier over the RGB channel bytes of an image.
///
/// Units are the channel bytes in row-major order, `width * height * 3` of them.
/// The budget follows the edge mask, which is fixed when the carrier is created.
#[derive(Debug, Clone)]
pub struct ImageCarrier {
    image: RgbImage,
    mask: EdgeMask,
}

impl ImageCarrier {
    pub fn new(image: RgbImage, options: &ImageOptions) -> Self {
        let mask = EdgeMask::detect(&image, options.edge_detector, options.sobel_threshold);
        Self { image, mask }
    }

    /// Opens PNG or BMP files, any alpha channel is dropped.
    pub fn open(file: &Path, options: &ImageOptions) -> Result<Self> {
        let image = image::open(file)
            .map_err(|e| {
                error!("Error opening image {file:?}: {e}");
                NestError::InvalidImageMedia
            })?
            .to_rgb8();

        Ok(Self::new(image, options))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn mask(&self) -> &EdgeMask {
        &self.mask
    }

    pub fn capacity_bits(&self) -> usize {
        self.mask.capacity()
    }

    /// Always PNG, a lossy output format would destroy the payload.
    pub fn write_png<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        self.image
            .write_to(writer, ImageFormat::Png)
            .map_err(|e| {
                error!("Error saving image: {e}");
                NestError::ImageEncodingError
            })
    }
}

impl Carrier for ImageCarrier {
    fn capacity(&self, _key: &StegoKey) -> usize {
        self.capacity_bits()
    }

    fn embed(&mut self, data: &[u8], key: &StegoKey) -> Result<()> {
        let capacity = self.capacity_bits();
        hide_data(&mut *self.image, capacity, data, key)
    }

    fn extract(&self, key: &StegoKey, len: usize) -> Result<Vec<u8>> {
        unveil_data(&*self.image, self.capacity_bits(), len, key)
    }
}

impl Persist for ImageCarrier {
    fn save_as(&mut self, file: &Path) -> Result<()> {
        persist_atomically(file, |f| self.write_png(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::image::EdgeDetector;
    use image::Rgb;
    use tempfile::TempDir;

    fn carrier_image() -> RgbImage {
        RgbImage::from_fn(64, 64, |x, y| {
            if (40..56).contains(&x) && (40..56).contains(&y) {
                Rgb([250, 250, 250])
            } else {
                Rgb([(x * 3) as u8, (y * 2) as u8, 40])
            }
        })
    }

    #[test]
    fn should_unveil_what_was_hidden() {
        let key = StegoKey::from_passphrase("SuperSecret42");
        let mut carrier = ImageCarrier::new(carrier_image(), &ImageOptions::default());
        carrier
            .embed(b"Hello World!", &key)
            .expect("Cannot hide in image");

        let unveiled = carrier.extract(&key, 12).expect("Cannot unveil from image");
        assert_eq!(unveiled, b"Hello World!");
    }

    #[test]
    fn embedding_only_touches_least_significant_bits() {
        let key = StegoKey::from([3u8; 32]);
        let original = carrier_image();
        let mut carrier = ImageCarrier::new(original.clone(), &ImageOptions::default());
        carrier.embed(&[0xA5; 64], &key).unwrap();

        let changed = original
            .iter()
            .zip(carrier.image().iter())
            .filter(|(a, b)| a != b)
            .inspect(|(a, b)| assert_eq!(**a & !1, **b & !1))
            .count();
        assert!(changed > 0);
    }

    #[test]
    fn capacity_is_the_same_before_and_after_embedding() {
        let key = StegoKey::from([4u8; 32]);
        for detector in [EdgeDetector::Sobel, EdgeDetector::LocalVariance] {
            let options = ImageOptions {
                edge_detector: detector,
                ..ImageOptions::default()
            };
            let mut carrier = ImageCarrier::new(carrier_image(), &options);
            let before = carrier.capacity(&key);
            carrier.embed(&[0xFF; 100], &key).unwrap();

            let reloaded = ImageCarrier::new(carrier.into_image(), &options);
            assert_eq!(reloaded.capacity(&key), before);
        }
    }

    #[test]
    fn too_large_payloads_leave_the_image_untouched() {
        let key = StegoKey::from([5u8; 32]);
        let mut carrier = ImageCarrier::new(carrier_image(), &ImageOptions::default());
        let too_many = carrier.capacity_bits() / 8 + 1;

        let result = carrier.embed(&vec![0xFF; too_many], &key);
        assert!(matches!(result, Err(NestError::CapacityExceeded { .. })));
        assert_eq!(carrier.image(), &carrier_image());
    }

    #[test]
    fn saved_png_keeps_the_payload() {
        let out_dir = TempDir::new().unwrap();
        let target = out_dir.path().join("image-with-secret.png");
        let key = StegoKey::from_passphrase("SuperSecret42");
        let mut carrier = ImageCarrier::new(carrier_image(), &ImageOptions::default());
        carrier.embed(b"Hello World!", &key).unwrap();
        carrier.save_as(&target).expect("Cannot save image");

        let reloaded = ImageCarrier::open(&target, &ImageOptions::default()).unwrap();
        assert_eq!(reloaded.extract(&key, 12).unwrap(), b"Hello World!");
    }
}
