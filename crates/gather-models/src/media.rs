//! Uploaded media records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::ids::{EventId, MediaId};
use crate::quality::MediaCategory;

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Clip,
    Image,
    Avatar,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Clip => "clip",
            MediaKind::Image => "image",
            MediaKind::Avatar => "avatar",
        }
    }

    /// Quality ladder category used to process this kind.
    pub fn category(&self) -> MediaCategory {
        match self {
            MediaKind::Clip => MediaCategory::Video,
            MediaKind::Image => MediaCategory::Image,
            MediaKind::Avatar => MediaCategory::Avatar,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of an uploaded media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// Renditions are being produced
    #[default]
    Processing,
    /// All renditions exist at their declared paths
    Available,
    /// Processing failed; partial outputs were removed
    Failed,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Processing => "processing",
            MediaStatus::Available => "available",
            MediaStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media item attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MediaRecord {
    pub id: MediaId,

    pub event_id: EventId,

    pub kind: MediaKind,

    #[serde(default)]
    pub status: MediaStatus,

    /// Uploaded source file
    pub input_path: PathBuf,

    /// Directory the renditions are written to
    pub output_dir: PathBuf,

    /// Rendition files, filled once processing succeeds
    #[serde(default)]
    pub outputs: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl MediaRecord {
    /// Create a new record in the processing state.
    pub fn new(
        event_id: EventId,
        kind: MediaKind,
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MediaId::new(),
            event_id,
            kind,
            status: MediaStatus::Processing,
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            outputs: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the renditions can be served.
    pub fn is_available(&self) -> bool {
        self.status == MediaStatus::Available
    }

    pub fn mark_available(&mut self, outputs: Vec<PathBuf>) {
        self.status = MediaStatus::Available;
        self.outputs = outputs;
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = MediaStatus::Failed;
        self.outputs.clear();
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}
