//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Stderr fragments FFprobe emits when the file is not decodable media.
const UNREADABLE_MARKERS: &[&str] = &[
    "Invalid data found when processing input",
    "moov atom not found",
    "could not find codec parameters",
    "End of file",
];

/// Media file information. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Width of the first video stream in pixels
    pub width: Option<u32>,
    /// Height of the first video stream in pixels
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file.
///
/// Returns [`MediaError::FileNotFound`] or [`MediaError::Unreadable`] when the
/// input cannot be processed at all, and [`MediaError::ProbeFailed`] when only
/// the metadata could not be obtained.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let started = Instant::now();
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;
    metrics::record_tool_duration("ffprobe", output.status.success(), started.elapsed().as_secs_f64());

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !output.status.success() {
        if UNREADABLE_MARKERS.iter().any(|m| stderr.contains(m)) {
            return Err(MediaError::Unreadable(stderr));
        }
        return Err(MediaError::probe_failed(
            "FFprobe exited with non-zero status",
            (!stderr.is_empty()).then_some(stderr),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    parse_probe(probe)
}

fn parse_probe(probe: FfprobeOutput) -> MediaResult<MediaInfo> {
    if probe.streams.is_empty() {
        return Err(MediaError::Unreadable("no media streams found".to_string()));
    }

    let is_type = |s: &FfprobeStream, t: &str| s.codec_type.as_deref() == Some(t);
    let video = probe.streams.iter().find(|s| is_type(s, "video"));
    let has_audio = probe.streams.iter().any(|s| is_type(s, "audio"));

    // Container duration first, then the video stream's own
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| parse_duration(f.duration.as_deref()))
        .or_else(|| video.and_then(|v| parse_duration(v.duration.as_deref())));

    Ok(MediaInfo {
        duration,
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        has_video: video.is_some(),
        has_audio,
    })
}

/// Parse a duration string; "N/A", negative and non-finite values are absent.
fn parse_duration(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}
