//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle that renders it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "gather_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "gather_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "gather_http_requests_in_flight";

    // Upload metrics
    pub const UPLOADS_TOTAL: &str = "gather_uploads_total";
    pub const UPLOAD_DURATION_SECONDS: &str = "gather_upload_duration_seconds";

    // Recommendation metrics
    pub const RECOMMENDATIONS_SERVED_TOTAL: &str = "gather_recommendations_served_total";
    pub const RECOMMENDATION_CANDIDATES: &str = "gather_recommendation_candidates";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a settled upload.
pub fn record_upload(kind: &str, success: bool, duration_secs: f64) {
    let labels = [
        ("kind", kind.to_string()),
        ("outcome", if success { "available" } else { "failed" }.to_string()),
    ];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    histogram!(names::UPLOAD_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a ranking request.
pub fn record_recommendations(candidates: usize) {
    counter!(names::RECOMMENDATIONS_SERVED_TOTAL).increment(1);
    histogram!(names::RECOMMENDATION_CANDIDATES).record(candidates as f64);
}

/// Route template for metric labels, so ids don't explode cardinality.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
