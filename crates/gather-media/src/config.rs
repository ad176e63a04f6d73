//! Media pipeline configuration.

use gather_models::quality::DEFAULT_PRESET;

/// Media pipeline configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Concurrent transcodes on the video queue
    pub video_concurrency: usize,
    /// Concurrent resizes on the image queue
    pub image_concurrency: usize,
    /// Hard cap on a single external tool invocation, in seconds
    pub tool_timeout_secs: Option<u64>,
    /// Target HLS segment length in seconds
    pub hls_segment_secs: u32,
    /// JPEG quality for still renditions (1-100)
    pub jpeg_quality: u8,
    /// x264 preset for video renditions
    pub video_preset: String,
    /// Skip renditions taller than the source
    pub skip_upscale: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video_concurrency: 1,
            image_concurrency: 1,
            tool_timeout_secs: Some(3600),
            hls_segment_secs: 6,
            jpeg_quality: 80,
            video_preset: DEFAULT_PRESET.to_string(),
            skip_upscale: true,
        }
    }
}

impl MediaConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            video_concurrency: std::env::var("MEDIA_VIDEO_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.video_concurrency),
            image_concurrency: std::env::var("MEDIA_IMAGE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.image_concurrency),
            tool_timeout_secs: match std::env::var("MEDIA_TOOL_TIMEOUT_SECS") {
                // 0 disables the cap
                Ok(s) => s.parse().ok().filter(|secs| *secs > 0),
                Err(_) => defaults.tool_timeout_secs,
            },
            hls_segment_secs: std::env::var("MEDIA_HLS_SEGMENT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.hls_segment_secs),
            jpeg_quality: std::env::var("MEDIA_JPEG_QUALITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|q: u8| q.clamp(1, 100))
                .unwrap_or(defaults.jpeg_quality),
            video_preset: std::env::var("MEDIA_VIDEO_PRESET").unwrap_or(defaults.video_preset),
            skip_upscale: std::env::var("MEDIA_SKIP_UPSCALE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.skip_upscale),
        }
    }
}
