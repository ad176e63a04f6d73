//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use gather_queue::QueueError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("No qualities requested")]
    EmptyLadder,

    #[error("Unreadable media: {0}")]
    Unreadable(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    Queue(QueueError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a probe error means the input cannot be processed at all,
    /// as opposed to merely lacking metadata.
    pub fn is_unreadable_input(&self) -> bool {
        matches!(
            self,
            MediaError::FileNotFound(_) | MediaError::Unreadable(_)
        )
    }
}

impl From<QueueError> for MediaError {
    /// Unwrap the job's own media error when the job failed with one.
    fn from(err: QueueError) -> Self {
        match err.downcast_source::<MediaError>() {
            Ok(media) => media,
            Err(other) => MediaError::Queue(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_error_unwraps_media_error() {
        let err = QueueError::JobFailed {
            job_id: "clip-1".to_string(),
            source: Box::new(MediaError::Timeout(30)),
        };
        assert!(matches!(MediaError::from(err), MediaError::Timeout(30)));
    }

    #[test]
    fn test_queue_error_kept_for_panics() {
        let err = QueueError::JobPanicked {
            job_id: "clip-1".to_string(),
            message: "boom".to_string(),
        };
        assert!(matches!(MediaError::from(err), MediaError::Queue(_)));
    }

    #[test]
    fn test_unreadable_classification() {
        assert!(MediaError::FileNotFound(PathBuf::from("/nope")).is_unreadable_input());
        assert!(MediaError::Unreadable("no streams".into()).is_unreadable_input());
        assert!(!MediaError::probe_failed("exit 1", None).is_unreadable_input());
    }
}
