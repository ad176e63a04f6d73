//! User profile, settings and recommendation handlers.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use gather_models::{Coordinates, RecommendationWeights, User, UserId};
use gather_recommend::{recommend_top, ScoredEvent};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Default number of recommendations returned.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 20;
/// Largest `limit` a caller may ask for.
pub const MAX_RECOMMENDATION_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct UpsertUserRequest {
    pub name: String,
    #[serde(default)]
    pub favourite_tags: BTreeSet<String>,
    #[serde(default)]
    pub followees: BTreeSet<UserId>,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

/// Create or replace a user profile.
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpsertUserRequest>,
) -> ApiResult<Json<User>> {
    if let Some(location) = &request.location {
        location.validate()?;
    }

    let mut user = User::new(user_id, request.name);
    user.favourite_tags = request.favourite_tags;
    user.followees = request.followees;
    user.location = request.location;

    Ok(Json(state.catalog.upsert_user(user).await))
}

/// Partial weights update; omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWeightsRequest {
    pub tags: Option<f64>,
    pub followees: Option<f64>,
    pub host_rating: Option<f64>,
    pub distance: Option<f64>,
    pub media: Option<f64>,
}

impl UpdateWeightsRequest {
    fn apply(&self, current: RecommendationWeights) -> RecommendationWeights {
        RecommendationWeights {
            tags: self.tags.unwrap_or(current.tags),
            followees: self.followees.unwrap_or(current.followees),
            host_rating: self.host_rating.unwrap_or(current.host_rating),
            distance: self.distance.unwrap_or(current.distance),
            media: self.media.unwrap_or(current.media),
        }
    }
}

/// Update a user's recommendation weights.
pub async fn update_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateWeightsRequest>,
) -> ApiResult<Json<RecommendationWeights>> {
    let user_id = UserId::from(user_id);
    let user = state
        .catalog
        .get_user(&user_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("user {}", user_id)))?;

    let weights = request.apply(user.weights);
    weights.validate()?;

    let weights = state
        .catalog
        .update_weights(&user_id, weights)
        .await
        .ok_or_else(|| ApiError::not_found(format!("user {}", user_id)))?;

    info!(user_id = %user_id, "Recommendation weights updated");
    Ok(Json(weights))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

/// Rank every event the user is not hosting.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<Json<Vec<ScoredEvent>>> {
    let user_id = UserId::from(user_id);
    let user = state
        .catalog
        .get_user(&user_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("user {}", user_id)))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
        .min(MAX_RECOMMENDATION_LIMIT);

    let candidates = state.catalog.candidates_for(&user_id).await;
    let candidate_count = candidates.len();
    let ranked = recommend_top(Some(&user), candidates, limit)?;

    metrics::record_recommendations(candidate_count);
    Ok(Json(ranked))
}
