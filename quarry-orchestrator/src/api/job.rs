//! Job API Handlers
//!
//! HTTP endpoints for submitting scraping jobs and following their progress.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use quarry_core::dto::job::{JobView, SubmitAck, SubmitJob};
use quarry_core::dto::queue::QueueStatus;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::JobService;

/// POST /scraping
/// Queue a new scraping job
pub async fn submit_job(
    State(service): State<Arc<JobService>>,
    Json(req): Json<SubmitJob>,
) -> ApiResult<Json<SubmitAck>> {
    tracing::debug!("Submitting job for category: {}", req.category);

    let ack = service.submit(req)?;

    Ok(Json(ack))
}

/// GET /scraping/status/{job_id}
/// Get the current view of a job
pub async fn get_job(
    State(service): State<Arc<JobService>>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobView>> {
    tracing::debug!("Getting job: {}", job_id);

    let view = service.get_job(job_id)?;

    Ok(Json(view))
}

/// GET /scraping/queue/status
/// Pending, processing and finished jobs
pub async fn queue_status(State(service): State<Arc<JobService>>) -> Json<QueueStatus> {
    Json(service.queue_status())
}
