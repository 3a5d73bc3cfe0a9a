//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod catalog;
pub mod error;
pub mod health;
pub mod job;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::service::JobService;

/// Create the main API router with all endpoints
pub fn create_router(service: Arc<JobService>) -> Router {
    Router::new()
        // Liveness
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // Job endpoints
        .route("/scraping", post(job::submit_job))
        .route("/scraping/status/{job_id}", get(job::get_job))
        .route("/scraping/queue/status", get(job::queue_status))
        // Discovery endpoints
        .route("/scraping/variants", get(catalog::list_variants))
        .route("/scraping/models", get(catalog::list_variants))
        .route("/scraping/categories", get(catalog::list_categories))
        // Add state and middleware
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
