//! Media status handlers.

use axum::extract::{Path, State};
use axum::Json;

use gather_models::{MediaId, MediaRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Get a media record and its processing status.
pub async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> ApiResult<Json<MediaRecord>> {
    let media_id = MediaId::from(media_id);
    state
        .catalog
        .get_media(&media_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("media {}", media_id)))
}
