//! Completion pipeline
//!
//! Best-effort post-processing of a finalized job: export the records, then
//! tell the requester where they went. Nothing here can change the job's
//! status, which was fixed before the pipeline started.

use std::sync::Arc;
use std::time::Duration;

use quarry_core::domain::job::Job;
use quarry_core::dto::job::CompletionNotice;

use crate::delivery::{ExportError, Notifier, ResultExporter};

/// Bounded retries with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(4),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// What happened to the notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The job has no notification target
    NoTarget,
    Delivered,
    Failed(String),
}

/// What the pipeline did for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionReport {
    /// The job produced no records
    Skipped,
    ExportFailed(String),
    Exported {
        reference: String,
        notification: Notification,
    },
}

pub struct CompletionPipeline {
    exporter: Arc<dyn ResultExporter>,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
}

impl CompletionPipeline {
    pub fn new(
        exporter: Arc<dyn ResultExporter>,
        notifier: Arc<dyn Notifier>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            exporter,
            notifier,
            retry,
        }
    }

    pub async fn run(&self, job: Job) -> CompletionReport {
        if job.records.is_empty() {
            tracing::debug!(job_id = %job.id, status = %job.status, "No records, nothing to export");
            return CompletionReport::Skipped;
        }

        let reference = match self.export_with_retry(&job).await {
            Ok(reference) => reference,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Export failed, skipping notification");
                return CompletionReport::ExportFailed(e.to_string());
            }
        };
        tracing::info!(job_id = %job.id, reference = %reference, records = job.records.len(), "Results exported");

        let notification = match &job.webhook {
            None => Notification::NoTarget,
            Some(target) => {
                let notice = CompletionNotice {
                    email: job.contact.clone(),
                    link: reference.clone(),
                };
                match self.notifier.notify(target, &notice).await {
                    Ok(()) => {
                        tracing::info!(job_id = %job.id, target = %target, "Completion notice delivered");
                        Notification::Delivered
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %job.id, target = %target, error = %e, "Completion notice failed");
                        Notification::Failed(e.to_string())
                    }
                }
            }
        };

        CompletionReport::Exported {
            reference,
            notification,
        }
    }

    async fn export_with_retry(&self, job: &Job) -> Result<String, ExportError> {
        let mut attempt = 0;
        let mut delay = self.retry.backoff;

        loop {
            attempt += 1;

            match self.exporter.export(job).await {
                Ok(reference) => {
                    if attempt > 1 {
                        tracing::info!(job_id = %job.id, attempt, "Export succeeded after retry");
                    }
                    return Ok(reference);
                }
                Err(e) if !e.is_transient() || attempt >= self.retry.attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        job_id = %job.id,
                        attempt,
                        max_attempts = self.retry.attempts,
                        error = %e,
                        "Export failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_backoff);
                }
            }
        }
    }
}
