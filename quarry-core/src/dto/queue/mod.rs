//! Queue snapshot DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::job::{processing_secs, seconds_between};
use super::round_secs;
use crate::domain::job::{Job, JobStatus};
use crate::domain::variant::Variant;

/// Status-appropriate summary of one job in the queue snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub category: String,
    pub variant: Variant,

    /// Seconds spent waiting for admission (pending jobs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_time: Option<f64>,

    /// Elapsed seconds for running jobs, total for finished ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Number of records (finished jobs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
}

impl JobSummary {
    pub fn from_job(job: &Job, now: DateTime<Utc>) -> Self {
        let mut summary = JobSummary {
            job_id: job.id,
            status: job.status,
            category: job.category.clone(),
            variant: job.variant,
            waiting_time: None,
            duration: None,
            record_count: None,
        };
        match job.status {
            JobStatus::Pending => {
                summary.waiting_time = Some(round_secs(seconds_between(job.submitted_at, now)));
            }
            JobStatus::Processing => {
                summary.duration = processing_secs(job, now).map(round_secs);
            }
            _ => {
                summary.duration = processing_secs(job, now).map(round_secs);
                summary.record_count = Some(job.records.len());
            }
        }
        summary
    }
}

/// Three disjoint groups of jobs computed at one instant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending_count: usize,
    pub processing_count: usize,
    pub finished_count: usize,
    pub pending: Vec<JobSummary>,
    pub processing: Vec<JobSummary>,
    pub finished: Vec<JobSummary>,
}

impl QueueStatus {
    /// Place a summary into the group matching its status
    pub fn push(&mut self, summary: JobSummary) {
        match summary.status {
            JobStatus::Pending => {
                self.pending_count += 1;
                self.pending.push(summary);
            }
            JobStatus::Processing => {
                self.processing_count += 1;
                self.processing.push(summary);
            }
            _ => {
                self.finished_count += 1;
                self.finished.push(summary);
            }
        }
    }

    /// Every summary in the snapshot
    pub fn all(&self) -> impl Iterator<Item = &JobSummary> {
        self.pending
            .iter()
            .chain(self.processing.iter())
            .chain(self.finished.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_summary_reports_wait() {
        let job = Job::new("pymes", Variant::Sequential, None, None);
        let summary = JobSummary::from_job(&job, job.submitted_at + chrono::Duration::seconds(3));
        assert_eq!(summary.waiting_time, Some(3.0));
        assert!(summary.duration.is_none());
        assert!(summary.record_count.is_none());
    }

    #[test]
    fn test_push_groups_by_status() {
        let mut status = QueueStatus::default();
        let pending = Job::new("a", Variant::Sequential, None, None);
        let mut running = Job::new("b", Variant::Bounded, None, None);
        running.start(Utc::now()).unwrap();

        status.push(JobSummary::from_job(&pending, Utc::now()));
        status.push(JobSummary::from_job(&running, Utc::now()));

        assert_eq!(status.pending_count, 1);
        assert_eq!(status.processing_count, 1);
        assert_eq!(status.finished_count, 0);
        assert_eq!(status.all().count(), 2);
    }
}
