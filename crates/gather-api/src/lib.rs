//! Axum HTTP API server.
//!
//! This crate provides:
//! - User, event and rating endpoints backed by an in-memory catalog
//! - Upload registration that drives the media pipelines and owns rollback
//! - Personalised event recommendations
//! - Health, readiness and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::UploadService;
pub use state::AppState;
pub use store::Catalog;
