//! Health Check API Handlers
//!
//! Simple liveness endpoints for monitoring.

use axum::{Json, http::StatusCode, response::IntoResponse};

/// GET /
/// Service banner
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "quarry",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
