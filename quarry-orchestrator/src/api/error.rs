//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::JobError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InvalidCategory { message: String, valid: Vec<String> },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::InvalidCategory { message, valid } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": message,
                    "valid_categories": valid,
                    "suggestion": "GET /scraping/categories lists the available categories",
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::InvalidCategory { category, valid } => ApiError::InvalidCategory {
                message: format!("Category '{}' is not available", category),
                valid,
            },
            JobError::Validation(msg) => ApiError::BadRequest(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
