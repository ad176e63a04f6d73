//! Quality ladders for media renditions.
//!
//! Ladders are static configuration keyed by [`MediaCategory`]. Video ladders
//! are ordered from highest to lowest resolution, and the rendition index in
//! the ladder is the index used for the HLS variant playlist names.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default audio sample rate for every video rendition
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;
/// Default audio channel count for every video rendition
pub const DEFAULT_AUDIO_CHANNELS: u8 = 2;

/// One video rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoQuality {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    /// Video bitrate in kbit/s
    pub video_bitrate_kbps: u32,
    /// Audio bitrate in kbit/s
    pub audio_bitrate_kbps: u32,
    pub audio_sample_rate: u32,
    pub audio_channels: u8,
}

impl VideoQuality {
    const fn new(name: &'static str, width: u32, height: u32, video_kbps: u32, audio_kbps: u32) -> Self {
        Self {
            name,
            width,
            height,
            video_bitrate_kbps: video_kbps,
            audio_bitrate_kbps: audio_kbps,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            audio_channels: DEFAULT_AUDIO_CHANNELS,
        }
    }

    /// Rate-control buffer size, always twice the video bitrate.
    pub fn buffer_size_kbps(&self) -> u32 {
        self.video_bitrate_kbps * 2
    }

    /// Bandwidth advertised for this rendition, in bits per second.
    pub fn bandwidth_bps(&self) -> u64 {
        (self.video_bitrate_kbps as u64 + self.audio_bitrate_kbps as u64) * 1000
    }
}

/// How an image is fitted into the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale to fit entirely inside the box, preserving aspect ratio
    #[default]
    Contain,
    /// Scale to fill the box, preserving aspect ratio and cropping the overflow
    Cover,
    /// Stretch to exactly the box, ignoring aspect ratio
    Fill,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
            FitMode::Fill => "fill",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One still-image rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageQuality {
    /// Name tag, also the output file stem (e.g. "high")
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
}

impl ImageQuality {
    const fn new(name: &'static str, width: u32, height: u32, fit: FitMode) -> Self {
        Self { name, width, height, fit }
    }
}

/// Media category a ladder applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Video,
    Image,
    Avatar,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Video => "video",
            MediaCategory::Image => "image",
            MediaCategory::Avatar => "avatar",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const VIDEO_LADDER: &[VideoQuality] = &[
    VideoQuality::new("1080p", 1920, 1080, 5000, 192),
    VideoQuality::new("720p", 1280, 720, 2800, 128),
    VideoQuality::new("480p", 854, 480, 1400, 128),
    VideoQuality::new("360p", 640, 360, 800, 96),
];

pub const IMAGE_LADDER: &[ImageQuality] = &[
    ImageQuality::new("high", 1920, 1080, FitMode::Contain),
    ImageQuality::new("medium", 1280, 720, FitMode::Contain),
    ImageQuality::new("low", 640, 360, FitMode::Contain),
];

pub const AVATAR_LADDER: &[ImageQuality] = &[
    ImageQuality::new("high", 512, 512, FitMode::Cover),
    ImageQuality::new("medium", 256, 256, FitMode::Cover),
    ImageQuality::new("low", 128, 128, FitMode::Cover),
];

/// A ladder of either video or image renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "qualities", rename_all = "snake_case")]
pub enum QualityLadder {
    Video(&'static [VideoQuality]),
    Image(&'static [ImageQuality]),
}

impl QualityLadder {
    pub fn len(&self) -> usize {
        match self {
            QualityLadder::Video(q) => q.len(),
            QualityLadder::Image(q) => q.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Look up the static ladder for a media category.
pub fn ladder(category: MediaCategory) -> QualityLadder {
    match category {
        MediaCategory::Video => QualityLadder::Video(VIDEO_LADDER),
        MediaCategory::Image => QualityLadder::Image(IMAGE_LADDER),
        MediaCategory::Avatar => QualityLadder::Image(AVATAR_LADDER),
    }
}
