//! Edge preference mask for images.
//!
//! All detectors look at the channels with their least significant bit cleared,
//! so the mask of a carrier and of the same carrier after embedding are identical.

use image::RgbImage;

use crate::capacity::{self, RGB_CHANNELS};

/// Percentile of local variance above which a pixel counts as edge
const VARIANCE_PERCENTILE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDetector {
    /// Sobel gradient magnitude compared against a threshold
    #[default]
    Sobel,
    /// Squared deviation from the 3x3 mean, compared against its 60th percentile
    LocalVariance,
}

/// Row-major mask, `true` marks pixels that prefer embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMask {
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

impl EdgeMask {
    pub fn detect(image: &RgbImage, detector: EdgeDetector, sobel_threshold: u32) -> Self {
        let gray = LsbFreeGray::new(image);
        let mask = match detector {
            EdgeDetector::Sobel => sobel(&gray, sobel_threshold),
            EdgeDetector::LocalVariance => local_variance(&gray),
        };

        Self {
            width: image.width(),
            height: image.height(),
            mask,
        }
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.mask[(y * self.width + x) as usize]
    }

    pub fn edge_pixels(&self) -> usize {
        self.mask.iter().filter(|e| **e).count()
    }

    pub fn total_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// capacity in bits under the edge weighted policy
    pub fn capacity(&self) -> usize {
        capacity::image_bits(self.edge_pixels(), self.total_pixels(), RGB_CHANNELS)
    }
}

/// Grayscale view (channel mean) of an image with all LSBs cleared
struct LsbFreeGray {
    width: i64,
    height: i64,
    values: Vec<u8>,
}

impl LsbFreeGray {
    fn new(image: &RgbImage) -> Self {
        let values = image
            .pixels()
            .map(|p| {
                let sum: u16 = p.0.iter().map(|c| (c & !1) as u16).sum();
                (sum / RGB_CHANNELS as u16) as u8
            })
            .collect();

        Self {
            width: image.width() as i64,
            height: image.height() as i64,
            values,
        }
    }

    /// border pixels are repeated
    fn at(&self, x: i64, y: i64) -> i64 {
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);
        self.values[(y * self.width + x) as usize] as i64
    }
}

fn sobel(gray: &LsbFreeGray, threshold: u32) -> Vec<bool> {
    let threshold = threshold as i64;
    let mut mask = Vec::with_capacity(gray.values.len());
    for y in 0..gray.height {
        for x in 0..gray.width {
            let gx = (gray.at(x + 1, y - 1) + 2 * gray.at(x + 1, y) + gray.at(x + 1, y + 1))
                - (gray.at(x - 1, y - 1) + 2 * gray.at(x - 1, y) + gray.at(x - 1, y + 1));
            let gy = (gray.at(x - 1, y + 1) + 2 * gray.at(x, y + 1) + gray.at(x + 1, y + 1))
                - (gray.at(x - 1, y - 1) + 2 * gray.at(x, y - 1) + gray.at(x + 1, y - 1));
            mask.push(gx * gx + gy * gy >= threshold * threshold);
        }
    }
    mask
}

fn local_variance(gray: &LsbFreeGray) -> Vec<bool> {
    let mut variance = Vec::with_capacity(gray.values.len());
    for y in 0..gray.height {
        for x in 0..gray.width {
            let mut sum = 0i64;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    sum += gray.at(x + dx, y + dy);
                }
            }
            let mean = sum as f64 / 9.0;
            let deviation = gray.at(x, y) as f64 - mean;
            variance.push(deviation * deviation);
        }
    }

    let threshold = percentile(&variance, VARIANCE_PERCENTILE);
    variance.into_iter().map(|v| v > threshold).collect()
}

/// linear interpolation between closest ranks
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
