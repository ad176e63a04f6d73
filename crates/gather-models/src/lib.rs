//! Shared data models for the Gather backend.
//!
//! This crate provides Serde-serializable types for:
//! - Users, events and their identifiers
//! - Per-user recommendation weights
//! - Quality ladders for video, image and avatar renditions
//! - Uploaded media records

pub mod error;
pub mod event;
pub mod ids;
pub mod media;
pub mod quality;
pub mod user;

pub use error::{ModelError, ModelResult};
pub use event::{Coordinates, Event};
pub use ids::{EventId, MediaId, UserId};
pub use media::{MediaKind, MediaRecord, MediaStatus};
pub use quality::{
    ladder, FitMode, ImageQuality, MediaCategory, QualityLadder, VideoQuality,
};
pub use user::{RecommendationWeights, User};
