#![deny(unreachable_patterns)]
//! Media rendition pipelines.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeout support
//! - Best-effort FFprobe metadata probing
//! - Multi-rendition HLS transcoding for uploaded clips
//! - Still-image resizing for event images and avatars
//! - [`MediaProcessor`], which serializes each pipeline on its own queue

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod processor;
pub mod progress;
pub mod resize;
pub mod video;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use probe::{probe_media, MediaInfo};
pub use processor::{MediaProcessor, ProcessorStats};
pub use progress::FfmpegProgress;
pub use resize::{image_output_path, resize_image, IMAGE_EXTENSION};
pub use video::{
    build_hls_command, fit_ladder, transcode_hls, variant_playlist_name, HlsOutput,
    MASTER_PLAYLIST_NAME,
};
