//! Event, rating and upload handlers.

use std::collections::BTreeSet;
use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gather_models::{Coordinates, Event, EventId, MediaKind, MediaRecord, UserId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertEventRequest {
    pub host_id: UserId,
    pub title: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub attendee_ids: Vec<UserId>,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
}

/// Create or replace an event. Ratings and media counts are kept.
pub async fn upsert_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<UpsertEventRequest>,
) -> ApiResult<Json<Event>> {
    if let Some(location) = &request.location {
        location.validate()?;
    }

    let mut event = Event::new(event_id, request.host_id, request.title);
    event.tags = request.tags;
    event.attendee_ids = request.attendee_ids;
    event.location = request.location;
    event.starts_at = request.starts_at;

    Ok(Json(state.catalog.upsert_event(event).await))
}

#[derive(Debug, Deserialize)]
pub struct RateEventRequest {
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingSummary {
    pub event_id: EventId,
    pub ratings: usize,
    pub average_rating: Option<f64>,
}

/// Record an attendee rating.
pub async fn rate_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<RateEventRequest>,
) -> ApiResult<Json<RatingSummary>> {
    let event_id = EventId::from(event_id);
    let event = state
        .catalog
        .add_rating(&event_id, request.rating)
        .await
        .ok_or_else(|| ApiError::not_found(format!("event {}", event_id)))??;

    Ok(Json(RatingSummary {
        ratings: event.ratings.len(),
        average_rating: event.average_rating(),
        event_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UploadMediaRequest {
    pub kind: MediaKind,
    /// Path of the uploaded file on the server's filesystem
    pub input_path: PathBuf,
}

/// Register an uploaded file and start processing it.
///
/// Returns immediately with the record in the processing state.
pub async fn upload_media(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<UploadMediaRequest>,
) -> ApiResult<(StatusCode, Json<MediaRecord>)> {
    let event_id = EventId::from(event_id);
    let upload = state
        .uploads
        .submit(&event_id, request.kind, request.input_path)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(upload.record)))
}
