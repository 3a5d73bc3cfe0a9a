//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::variant::Variant;

/// One extracted record
///
/// The fields belong to the strategy that produced it; the orchestrator never
/// looks inside.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Scraping job record
///
/// Owned by the orchestrator's registry for its whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub category: String,
    pub variant: Variant,
    pub webhook: Option<String>,
    pub contact: Option<String>,
    pub status: JobStatus,
    pub records: Vec<Record>,
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Measured processing time in seconds, set at finalization
    pub duration_secs: Option<f64>,
}

/// Job execution status
///
/// ```text
/// pending -> processing -> completed | partial | error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Partial,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Partial | JobStatus::Error)
    }

    /// Whether the status machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Partial)
                | (JobStatus::Processing, JobStatus::Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Partial => "partial",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome applied to a job when it is finalized
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub status: JobStatus,
    pub records: Vec<Record>,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// A status change the status machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move job from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Job {
    /// Create a new pending job with a fresh identifier
    pub fn new(
        category: impl Into<String>,
        variant: Variant,
        webhook: Option<String>,
        contact: Option<String>,
    ) -> Self {
        Job {
            id: Uuid::new_v4(),
            category: category.into(),
            variant,
            webhook,
            contact,
            status: JobStatus::Pending,
            records: Vec::new(),
            error: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            duration_secs: None,
        }
    }

    /// Move a pending job to processing, stamping the start time
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.transition(JobStatus::Processing)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Apply a terminal outcome to a processing job
    pub fn finish(&mut self, completion: Completion) -> Result<(), InvalidTransition> {
        if !completion.status.is_terminal() {
            return Err(InvalidTransition {
                from: self.status,
                to: completion.status,
            });
        }
        self.transition(completion.status)?;
        self.records = completion.records;
        self.error = completion.error;
        self.finished_at = Some(completion.finished_at);
        self.duration_secs = Some(completion.duration_secs);
        Ok(())
    }

    /// Whether records should be exposed to readers
    pub fn exposes_records(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Partial)
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
