//! Video carrier over an array of decoded frames.
//!
//! Only a key dependent subset of frames carries data. The payload is split into
//! consecutive chunks, one per selected frame in ascending frame order, each chunk
//! embedded like into a still image with the same stego key.

mod frame_store;

pub use frame_store::{FrameStore, PngFrameDirectory};

use std::path::Path;

use image::RgbImage;
use log::debug;

use crate::capacity;
use crate::error::NestError;
use crate::media::image::ImageCarrier;
use crate::media::{Carrier, CarrierOptions, Persist};
use crate::positions::Positions;
use crate::result::Result;
use crate::StegoKey;

#[derive(Debug, Clone)]
pub struct VideoCarrier {
    frames: Vec<ImageCarrier>,
    usage_ratio: f64,
}

/// Bytes per selected frame, `(frame index, byte count)`
type Plan = Vec<(usize, usize)>;

impl VideoCarrier {
    pub fn new(frames: Vec<RgbImage>, options: &CarrierOptions) -> Result<Self> {
        if frames.is_empty() {
            return Err(NestError::InvalidVideoMedia);
        }
        let frames = frames
            .into_iter()
            .map(|frame| ImageCarrier::new(frame, &options.image))
            .collect();

        Ok(Self {
            frames,
            usage_ratio: options.video.usage_ratio,
        })
    }

    pub fn load<S: FrameStore + ?Sized>(
        store: &S,
        source: &Path,
        options: &CarrierOptions,
    ) -> Result<Self> {
        Self::new(store.read_frames(source)?, options)
    }

    pub fn store<S: FrameStore + ?Sized>(&self, store: &S, target: &Path) -> Result<()> {
        let frames: Vec<&RgbImage> = self.frames.iter().map(ImageCarrier::image).collect();
        store.write_frames(&frames, target)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&RgbImage> {
        self.frames.get(index).map(ImageCarrier::image)
    }

    /// `max(1, floor(frames * usage_ratio))` distinct frame indices, ascending
    pub fn select_frames(&self, key: &StegoKey) -> Vec<usize> {
        select_frames(key, self.frame_count(), self.usage_ratio)
    }

    /// Dry run of the distribution, nothing is touched.
    fn plan(&self, selected: &[usize], len: usize) -> Result<Plan> {
        let mut remaining = len;
        let mut plan = Plan::new();
        for &index in selected {
            if remaining == 0 {
                break;
            }
            let take = (self.frames[index].capacity_bits() / 8).min(remaining);
            if take > 0 {
                plan.push((index, take));
                remaining -= take;
            }
        }
        if remaining > 0 {
            return Err(NestError::InsufficientCapacity {
                placed: len - remaining,
                required: len,
            });
        }

        Ok(plan)
    }
}

/// Picks the frames that carry data, shared by embedding and extraction.
pub fn select_frames(key: &StegoKey, frame_count: usize, usage_ratio: f64) -> Vec<usize> {
    if frame_count == 0 {
        return Vec::new();
    }
    let wanted = ((frame_count as f64 * usage_ratio).floor() as usize).clamp(1, frame_count);
    let mut selected: Vec<usize> = Positions::new(key, frame_count).take(wanted).collect();
    selected.sort_unstable();

    selected
}

impl Carrier for VideoCarrier {
    fn capacity(&self, key: &StegoKey) -> usize {
        self.select_frames(key)
            .iter()
            .map(|i| self.frames[*i].capacity_bits())
            .sum()
    }

    fn embed(&mut self, data: &[u8], key: &StegoKey) -> Result<()> {
        capacity::ensure_fits(data.len(), self.capacity(key))?;
        let selected = self.select_frames(key);
        let plan = self.plan(&selected, data.len())?;
        debug!(
            "spreading {} bytes over {} of {} frames",
            data.len(),
            plan.len(),
            self.frame_count()
        );

        let mut offset = 0;
        for (index, take) in plan {
            self.frames[index].embed(&data[offset..offset + take], key)?;
            offset += take;
        }

        Ok(())
    }

    fn extract(&self, key: &StegoKey, len: usize) -> Result<Vec<u8>> {
        capacity::ensure_fits(len, self.capacity(key))?;
        let selected = self.select_frames(key);
        let plan = self.plan(&selected, len)?;

        let mut data = Vec::with_capacity(len);
        for (index, take) in plan {
            data.extend(self.frames[index].extract(key, take)?);
        }

        Ok(data)
    }
}

impl Persist for VideoCarrier {
    /// `file` is the target frame directory
    fn save_as(&mut self, file: &Path) -> Result<()> {
        self.store(&PngFrameDirectory, file)
    }
}
