//! Embeddable-bit budgets per carrier policy.

use crate::error::NestError;
use crate::result::Result;

/// Color channels per pixel, carriers are handled as RGB
pub const RGB_CHANNELS: usize = 3;

/// Edge pixels take one bit per channel, smooth pixels a quarter bit per channel.
///
/// `floor(edge * channels * 1 + smooth * channels * 0.25)`
pub fn image_bits(edge_pixels: usize, total_pixels: usize, channels: usize) -> usize {
    let smooth_pixels = total_pixels.saturating_sub(edge_pixels);

    edge_pixels * channels + (smooth_pixels * channels) / 4
}

/// Flat policy, every sample (of every channel) offers `lsb_depth` bits.
pub fn audio_bits(samples: usize, lsb_depth: u8) -> usize {
    samples * lsb_depth as usize
}

/// One marker slot per word.
pub fn text_bits(words: usize) -> usize {
    words
}

/// Fails with [`NestError::CapacityExceeded`] when `bytes` do not fit into `capacity` bits.
pub fn ensure_fits(bytes: usize, capacity: usize) -> Result<()> {
    let required = bytes * 8;
    if required > capacity {
        return Err(NestError::CapacityExceeded { required, capacity });
    }

    Ok(())
}
