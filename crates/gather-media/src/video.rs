//! Multi-rendition HLS transcoding.
//!
//! One FFmpeg invocation produces every rendition of a clip: each quality is
//! its own stream-mapped output with its own bitrate, resolution and audio
//! parameters, written as `index-<n>.m3u8` next to a master `index.m3u8`.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use gather_models::quality::{DEFAULT_AUDIO_CODEC, DEFAULT_VIDEO_CODEC};
use gather_models::VideoQuality;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_media, MediaInfo};

/// File name of the master playlist referencing every rendition.
pub const MASTER_PLAYLIST_NAME: &str = "index.m3u8";

/// Keyframe interval in frames, so segments cut on the same boundaries.
const GOP_SIZE: u32 = 48;

/// File name of the variant playlist for rendition `index`.
pub fn variant_playlist_name(index: usize) -> String {
    format!("index-{}.m3u8", index)
}

/// Files produced by a successful HLS transcode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HlsOutput {
    pub master_playlist: PathBuf,
    /// Variant playlists, in rendition order
    pub variant_playlists: Vec<PathBuf>,
    /// Renditions actually produced
    pub renditions: Vec<VideoQuality>,
}

impl HlsOutput {
    fn new(output_dir: &Path, renditions: Vec<VideoQuality>) -> Self {
        Self {
            master_playlist: output_dir.join(MASTER_PLAYLIST_NAME),
            variant_playlists: (0..renditions.len())
                .map(|i| output_dir.join(variant_playlist_name(i)))
                .collect(),
            renditions,
        }
    }

    /// Master playlist followed by every variant playlist.
    pub fn files(&self) -> Vec<PathBuf> {
        std::iter::once(self.master_playlist.clone())
            .chain(self.variant_playlists.iter().cloned())
            .collect()
    }
}

/// Drop renditions taller than the source.
///
/// The smallest rendition is always kept so a low-resolution source still
/// gets one output. Unknown source height keeps the whole ladder.
pub fn fit_ladder(qualities: &[VideoQuality], source_height: Option<u32>) -> Vec<VideoQuality> {
    let Some(source_height) = source_height.filter(|h| *h > 0) else {
        return qualities.to_vec();
    };

    let fitting: Vec<VideoQuality> = qualities
        .iter()
        .filter(|q| q.height <= source_height)
        .copied()
        .collect();

    if !fitting.is_empty() {
        return fitting;
    }

    qualities
        .iter()
        .min_by_key(|q| q.height)
        .copied()
        .into_iter()
        .collect()
}

/// Build the single FFmpeg invocation producing all renditions.
pub fn build_hls_command(
    input: &Path,
    output_dir: &Path,
    qualities: &[VideoQuality],
    info: &MediaInfo,
    config: &MediaConfig,
) -> MediaResult<FfmpegCommand> {
    if qualities.is_empty() {
        return Err(MediaError::EmptyLadder);
    }

    let audio = info.has_audio;
    let mut cmd = FfmpegCommand::new(input, output_dir.join("index-%v.m3u8"));

    for _ in qualities {
        cmd = cmd.map("0:v:0");
        if audio {
            cmd = cmd.map("0:a:0");
        }
    }

    cmd = cmd
        .video_codec(DEFAULT_VIDEO_CODEC)
        .preset(config.video_preset.clone())
        .output_args([
            "-g".to_string(),
            GOP_SIZE.to_string(),
            "-keyint_min".to_string(),
            GOP_SIZE.to_string(),
        ])
        .output_args(["-sc_threshold", "0"]);
    if audio {
        cmd = cmd.audio_codec(DEFAULT_AUDIO_CODEC);
    }

    for (i, q) in qualities.iter().enumerate() {
        cmd = cmd
            .stream_opt(
                "filter",
                'v',
                i,
                format!(
                    "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
                    q.width, q.height
                ),
            )
            .stream_opt("b", 'v', i, format!("{}k", q.video_bitrate_kbps))
            .stream_opt("maxrate", 'v', i, format!("{}k", q.video_bitrate_kbps))
            .stream_opt("bufsize", 'v', i, format!("{}k", q.buffer_size_kbps()));

        if audio {
            cmd = cmd
                .stream_opt("b", 'a', i, format!("{}k", q.audio_bitrate_kbps))
                .stream_opt("ar", 'a', i, q.audio_sample_rate.to_string())
                .stream_opt("ac", 'a', i, q.audio_channels.to_string());
        }
    }

    // Without a known duration, stop at the end of the shortest stream
    cmd = match info.duration {
        Some(duration) => cmd.duration(duration),
        None => cmd.shortest(),
    };

    let stream_map = (0..qualities.len())
        .map(|i| {
            if audio {
                format!("v:{i},a:{i}")
            } else {
                format!("v:{i}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let segment_pattern = output_dir.join("segment-%v-%03d.ts");

    Ok(cmd
        .format("hls")
        .output_args(["-hls_time".to_string(), config.hls_segment_secs.to_string()])
        .output_args(["-hls_playlist_type", "vod", "-hls_flags", "independent_segments"])
        .output_arg("-hls_segment_filename")
        .output_arg(segment_pattern.to_string_lossy().to_string())
        .output_args(["-master_pl_name", MASTER_PLAYLIST_NAME])
        .output_arg("-var_stream_map")
        .output_arg(stream_map))
}

/// Probe, then transcode `input` into an HLS ladder under `output_dir`.
///
/// A probe that only fails to produce metadata is tolerated; an unreadable
/// input fails the transcode. Partial output is left in place on failure.
pub async fn transcode_hls(
    input: &Path,
    output_dir: &Path,
    qualities: &[VideoQuality],
    config: &MediaConfig,
) -> MediaResult<HlsOutput> {
    if qualities.is_empty() {
        return Err(MediaError::EmptyLadder);
    }

    let info = match probe_media(input).await {
        Ok(info) if !info.has_video => {
            return Err(MediaError::Unreadable("no video stream found".to_string()));
        }
        Ok(info) => info,
        Err(e) if e.is_unreadable_input() => return Err(e),
        Err(e) => {
            warn!(input = %input.display(), error = %e, "Probe failed, transcoding without duration");
            MediaInfo {
                has_video: true,
                has_audio: true,
                ..Default::default()
            }
        }
    };

    let renditions = if config.skip_upscale {
        fit_ladder(qualities, info.height)
    } else {
        qualities.to_vec()
    };

    tokio::fs::create_dir_all(output_dir).await?;
    let cmd = build_hls_command(input, output_dir, &renditions, &info, config)?;

    let total_ms = info.duration.map(|d| (d * 1000.0) as i64);
    let input_name = input.display().to_string();
    FfmpegRunner::new()
        .with_optional_timeout(config.tool_timeout_secs)
        .run_with_progress(&cmd, move |progress| {
            if let Some(total_ms) = total_ms {
                debug!(input = %input_name, percent = progress.percentage(total_ms), "Transcode progress");
            }
        })
        .await?;

    let output = HlsOutput::new(output_dir, renditions);
    for file in output.files() {
        if !tokio::fs::try_exists(&file).await.unwrap_or(false) {
            return Err(MediaError::ffmpeg_failed(
                format!("expected output missing: {}", file.display()),
                None,
                None,
            ));
        }
    }

    info!(
        input = %input.display(),
        renditions = output.renditions.len(),
        "HLS transcode complete"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_models::quality::VIDEO_LADDER;

    fn info(duration: Option<f64>, has_audio: bool) -> MediaInfo {
        MediaInfo {
            duration,
            width: Some(1920),
            height: Some(1080),
            has_video: true,
            has_audio,
        }
    }

    fn pair_present(args: &[String], a: &str, b: &str) -> bool {
        args.windows(2).any(|w| w[0] == a && w[1] == b)
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(variant_playlist_name(0), "index-0.m3u8");
        assert_eq!(variant_playlist_name(3), "index-3.m3u8");
    }

    #[test]
    fn test_command_maps_every_rendition() {
        let config = MediaConfig::default();
        let cmd = build_hls_command(
            Path::new("in.mp4"),
            Path::new("/out"),
            &VIDEO_LADDER[..2],
            &info(Some(20.0), true),
            &config,
        )
        .unwrap();
        let args = cmd.build_args();

        assert_eq!(args.iter().filter(|a| *a == "0:v:0").count(), 2);
        assert_eq!(args.iter().filter(|a| *a == "0:a:0").count(), 2);
        assert!(pair_present(&args, "-b:v:0", "5000k"));
        assert!(pair_present(&args, "-bufsize:v:0", "10000k"));
        assert!(pair_present(&args, "-b:v:1", "2800k"));
        assert!(pair_present(&args, "-ar:a:1", "48000"));
        assert!(pair_present(&args, "-ac:a:1", "2"));
        assert!(pair_present(&args, "-var_stream_map", "v:0,a:0 v:1,a:1"));
        assert!(pair_present(&args, "-master_pl_name", "index.m3u8"));
        assert!(pair_present(&args, "-t", "20.000"));
        assert!(!args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/out/index-%v.m3u8"));
    }

    #[test]
    fn test_unknown_duration_uses_shortest() {
        let cmd = build_hls_command(
            Path::new("in.mp4"),
            Path::new("/out"),
            VIDEO_LADDER,
            &info(None, true),
            &MediaConfig::default(),
        )
        .unwrap();
        let args = cmd.build_args();

        assert!(args.contains(&"-shortest".to_string()));
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_silent_input_has_no_audio_streams() {
        let cmd = build_hls_command(
            Path::new("in.mp4"),
            Path::new("/out"),
            &VIDEO_LADDER[..2],
            &info(Some(5.0), false),
            &MediaConfig::default(),
        )
        .unwrap();
        let args = cmd.build_args();

        assert!(!args.contains(&"0:a:0".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(pair_present(&args, "-var_stream_map", "v:0 v:1"));
    }

    #[test]
    fn test_empty_ladder_rejected() {
        let result = build_hls_command(
            Path::new("in.mp4"),
            Path::new("/out"),
            &[],
            &info(None, true),
            &MediaConfig::default(),
        );
        assert!(matches!(result, Err(MediaError::EmptyLadder)));
    }

    #[test]
    fn test_fit_ladder() {
        let fitted = fit_ladder(VIDEO_LADDER, Some(720));
        assert_eq!(fitted.iter().map(|q| q.name).collect::<Vec<_>>(), ["720p", "480p", "360p"]);

        let tiny = fit_ladder(VIDEO_LADDER, Some(144));
        assert_eq!(tiny.len(), 1);
        assert_eq!(tiny[0].name, "360p");

        assert_eq!(fit_ladder(VIDEO_LADDER, None).len(), VIDEO_LADDER.len());
    }

    #[test]
    fn test_output_files() {
        let output = HlsOutput::new(Path::new("/media/clip"), VIDEO_LADDER[..2].to_vec());
        assert_eq!(
            output.files(),
            vec![
                PathBuf::from("/media/clip/index.m3u8"),
                PathBuf::from("/media/clip/index-0.m3u8"),
                PathBuf::from("/media/clip/index-1.m3u8"),
            ]
        );
    }
}
