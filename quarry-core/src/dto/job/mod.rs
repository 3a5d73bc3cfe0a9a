//! Job DTOs for the HTTP front door

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::round_secs;
use crate::domain::job::{Job, JobStatus, Record};
use crate::domain::variant::Variant;

/// Request to submit a new scraping job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJob {
    pub category: String,

    /// Strategy variant, defaults to the fully concurrent one
    #[serde(default, alias = "model")]
    pub variant: Variant,

    /// Where to POST the completion notice
    #[serde(default)]
    pub webhook: Option<String>,

    /// Requester contact address
    #[serde(default)]
    pub email: Option<String>,
}

/// Acknowledgement returned once a job is queued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub job_id: Uuid,
    pub status: String,
    pub message: String,
}

impl SubmitAck {
    pub fn accepted(job_id: Uuid) -> Self {
        SubmitAck {
            job_id,
            status: "accepted".to_string(),
            message: format!(
                "Scraping job queued. Use GET /scraping/status/{job_id} to follow it"
            ),
        }
    }
}

/// Snapshot of a single job as returned by the status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub category: String,
    pub variant: Variant,
    pub email: Option<String>,

    /// Seconds spent processing, live while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
}

impl JobView {
    /// Render a job as seen at `now`
    pub fn from_job(job: &Job, now: DateTime<Utc>) -> Self {
        let records = job.exposes_records().then(|| job.records.clone());
        JobView {
            job_id: job.id,
            status: job.status,
            category: job.category.clone(),
            variant: job.variant,
            email: job.contact.clone(),
            duration: processing_secs(job, now).map(round_secs),
            error: job.error.clone(),
            record_count: records.as_ref().map(Vec::len),
            records,
        }
    }
}

/// Payload POSTed to the webhook once results are exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionNotice {
    pub email: Option<String>,
    pub link: String,
}

/// Seconds a job has spent processing at `now`
///
/// Finished jobs report their measured duration, running jobs the live
/// elapsed time, pending jobs nothing.
pub fn processing_secs(job: &Job, now: DateTime<Utc>) -> Option<f64> {
    if let Some(secs) = job.duration_secs {
        return Some(secs);
    }
    job.started_at.map(|started| seconds_between(started, now))
}

pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    (delta.num_milliseconds().max(0) as f64) / 1000.0
}
