//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use gather_api::{create_router, ApiConfig, AppState};
use gather_media::MediaConfig;

fn app(media_root: &std::path::Path) -> Router {
    let config = ApiConfig {
        media_root: media_root.to_path_buf(),
        ..Default::default()
    };
    let state = AppState::new(config, MediaConfig::default()).unwrap();
    create_router(state, None)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) {
    let (status, _) = send(
        app,
        Method::PUT,
        "/api/users/ada",
        Some(json!({
            "name": "Ada",
            "favourite_tags": ["jazz", "food"],
            "followees": ["grace"],
            "location": {"lat": 52.52, "lon": 13.405}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (id, host, body) in [
        ("jazz", "grace", json!({"tags": ["jazz", "food"]})),
        ("run", "linus", json!({"tags": ["sport"], "attendee_ids": ["grace"]})),
        ("own", "ada", json!({"tags": ["jazz", "food"]})),
        ("quiet", "linus", json!({})),
    ] {
        let mut body = body;
        body["host_id"] = json!(host);
        body["title"] = json!(id);
        let (status, _) = send(app, Method::PUT, &format!("/api/events/{id}"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn health_reports_healthy() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(dir.path()), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let dir = TempDir::new().unwrap();
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn recommendations_rank_and_exclude_own_events() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/users/ada/recommendations", None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["event"]["id"].as_str().unwrap())
        .collect();
    // jazz: 2 tags, run: 1 followee, quiet: nothing (input order kept for ties)
    assert_eq!(ids, ["jazz", "run", "quiet"]);
    assert_eq!(body[0]["score"], 2.0);
    assert_eq!(body[0]["breakdown"]["tags"], 2.0);
}

#[tokio::test]
async fn recommendation_limit_truncates() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    seed(&app).await;

    let (status, body) =
        send(&app, Method::GET, "/api/users/ada/recommendations?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn host_ratings_feed_into_ranking() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    seed(&app).await;

    // Only host rating counts
    let (status, weights) = send(
        &app,
        Method::PATCH,
        "/api/users/ada/settings",
        Some(json!({"tags": 0.0, "followees": 0.0, "distance": 0.0, "media": 0.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(weights["host_rating"], 1.0);

    let (status, summary) = send(
        &app,
        Method::POST,
        "/api/events/quiet/ratings",
        Some(json!({"rating": 4.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["average_rating"], 4.0);

    let (_, body) = send(&app, Method::GET, "/api/users/ada/recommendations", None).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["event"]["id"].as_str().unwrap())
        .collect();
    // Both of linus's events inherit his average
    assert_eq!(ids, ["quiet", "run", "jazz"]);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(
        &app(dir.path()),
        Method::GET,
        "/api/users/nobody/recommendations",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn no_candidates_is_a_client_error() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    send(&app, Method::PUT, "/api/users/solo", Some(json!({"name": "Solo"}))).await;
    send(
        &app,
        Method::PUT,
        "/api/events/mine",
        Some(json!({"host_id": "solo", "title": "My party"})),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/users/solo/recommendations", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}

#[tokio::test]
async fn negative_weight_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    seed(&app).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/users/ada/settings",
        Some(json!({"media": -2.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn out_of_range_rating_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path());
    seed(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/events/jazz/ratings",
        Some(json!({"rating": 11.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/events/missing/ratings",
        Some(json!({"rating": 3.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_upload_becomes_available() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir.path().join("media"));
    seed(&app).await;

    let input = dir.path().join("poster.png");
    image::RgbImage::new(120, 90).save(&input).unwrap();

    let (status, record) = send(
        &app,
        Method::POST,
        "/api/events/jazz/media",
        Some(json!({"kind": "image", "input_path": input})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(record["status"], "processing");

    let uri = format!("/api/media/{}", record["id"].as_str().unwrap());
    let mut current = Value::Null;
    for _ in 0..100 {
        let (_, body) = send(&app, Method::GET, &uri, None).await;
        current = body;
        if current["status"] != "processing" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(current["status"], "available");
    assert_eq!(current["outputs"].as_array().unwrap().len(), 3);

    // The available media now counts for the event
    let (_, body) = send(&app, Method::GET, "/api/users/ada/recommendations", None).await;
    let jazz = body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["event"]["id"] == "jazz")
        .unwrap();
    assert_eq!(jazz["breakdown"]["media"], 1.0);
}

#[tokio::test]
async fn upload_for_unknown_event_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(
        &app(dir.path()),
        Method::POST,
        "/api/events/ghost/media",
        Some(json!({"kind": "clip", "input_path": "/tmp/none.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_media_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(&app(dir.path()), Method::GET, "/api/media/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
