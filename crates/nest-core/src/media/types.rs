use std::path::Path;

use enum_dispatch::enum_dispatch;

use super::audio::AudioCarrier;
use super::image::ImageCarrier;
use super::text::TextCarrier;
use super::video::{PngFrameDirectory, VideoCarrier};
use super::{Carrier, CarrierOptions, Persist};
use crate::error::NestError;
use crate::result::Result;
use crate::StegoKey;

/// a carrier medium for steganography
#[enum_dispatch(Carrier)]
#[derive(Debug, Clone)]
pub enum Media {
    Image(ImageCarrier),
    Audio(AudioCarrier),
    Video(VideoCarrier),
    Text(TextCarrier),
}

impl Media {
    /// Picks the carrier by file extension, a directory is read as video frames.
    pub fn from_file(f: &Path, options: &CarrierOptions) -> Result<Self> {
        options.validate()?;
        if f.is_dir() {
            return Ok(Self::Video(VideoCarrier::load(
                &PngFrameDirectory,
                f,
                options,
            )?));
        }

        let ext = f
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or(NestError::UnsupportedMedia)?;
        match ext.as_str() {
            "png" | "bmp" => Ok(Self::Image(ImageCarrier::open(f, &options.image)?)),
            "wav" => Ok(Self::Audio(AudioCarrier::open(f, &options.audio)?)),
            "txt" => Ok(Self::Text(TextCarrier::open(f)?)),
            _ => Err(NestError::UnsupportedMedia),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Media::Image(_) => "image",
            Media::Audio(_) => "audio",
            Media::Video(_) => "video",
            Media::Text(_) => "text",
        }
    }
}

impl Persist for Media {
    fn save_as(&mut self, file: &Path) -> Result<()> {
        match self {
            Media::Image(i) => i.save_as(file),
            Media::Audio(a) => a.save_as(file),
            Media::Video(v) => v.save_as(file),
            Media::Text(t) => t.save_as(file),
        }
    }
}
