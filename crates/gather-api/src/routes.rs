//! API routes.

use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    get_media, get_recommendations, health, rate_event, ready, update_settings, upload_media,
    upsert_event, upsert_user,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let user_routes = Router::new()
        .route("/users/:user_id", put(upsert_user))
        .route("/users/:user_id/settings", patch(update_settings))
        .route("/users/:user_id/recommendations", get(get_recommendations));

    let event_routes = Router::new()
        .route("/events/:event_id", put(upsert_event))
        .route("/events/:event_id/ratings", post(rate_event))
        .route("/events/:event_id/media", post(upload_media))
        .route("/media/:media_id", get(get_media));

    let api_routes = Router::new().merge(user_routes).merge(event_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
