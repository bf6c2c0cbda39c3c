use crate::error::NestError;
use crate::media::image::EdgeDetector;
use crate::result::Result;

/// Default Sobel gradient magnitude from which on a pixel counts as edge
pub const DEFAULT_SOBEL_THRESHOLD: u32 = 100;

/// Default share of video frames that carry data
pub const DEFAULT_VIDEO_USAGE_RATIO: f64 = 0.5;

/// Carrier configuration for embedding and extraction.
///
/// Extraction has to use the same options as embedding, they change capacities and
/// therefore where data ends up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarrierOptions {
    pub image: ImageOptions,
    pub audio: AudioOptions,
    pub video: VideoOptions,
}

impl CarrierOptions {
    pub fn with_edge_detector(mut self, detector: EdgeDetector) -> Self {
        self.image.edge_detector = detector;
        self
    }

    pub fn with_sobel_threshold(mut self, threshold: u32) -> Self {
        self.image.sobel_threshold = threshold;
        self
    }

    pub fn with_lsb_depth(mut self, depth: u8) -> Self {
        self.audio.lsb_depth = depth;
        self
    }

    pub fn with_video_usage_ratio(mut self, ratio: f64) -> Self {
        self.video.usage_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=8).contains(&self.audio.lsb_depth) {
            return Err(NestError::InvalidOptions(format!(
                "audio LSB depth must be within 1..=8, got {}",
                self.audio.lsb_depth
            )));
        }
        if !(self.video.usage_ratio > 0.0 && self.video.usage_ratio <= 1.0) {
            return Err(NestError::InvalidOptions(format!(
                "video usage ratio must be within (0, 1], got {}",
                self.video.usage_ratio
            )));
        }

        Ok(())
    }
}

/// Options for edge aware LSB image embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    /// The detector deciding which pixels count as edges, edges get the full capacity.
    pub edge_detector: EdgeDetector,

    /// Only used by [`EdgeDetector::Sobel`]
    pub sobel_threshold: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            edge_detector: EdgeDetector::default(),
            sobel_threshold: DEFAULT_SOBEL_THRESHOLD,
        }
    }
}

/// Options for WAV audio embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioOptions {
    /// How many of the lowest bits of each sample are used
    pub lsb_depth: u8,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self { lsb_depth: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoOptions {
    /// Share of frames that are selected for embedding, within (0, 1]
    pub usage_ratio: f64,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            usage_ratio: DEFAULT_VIDEO_USAGE_RATIO,
        }
    }
}
