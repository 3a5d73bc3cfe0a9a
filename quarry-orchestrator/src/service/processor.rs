//! Job processor
//!
//! Takes one queued job through admission, supervised execution and
//! finalization. Every path out of [`JobProcessor::execute`] ends in exactly
//! one call to the registry's `finalize`.

use std::sync::Arc;

use chrono::Utc;
use quarry_core::domain::job::{Completion, Job, JobStatus};
use tokio::time::Instant;
use uuid::Uuid;

use super::admission::ConcurrencyLimiter;
use super::supervisor::{RunOutcome, TimeoutSupervisor, Verdict};
use crate::repository::{JobRegistry, RegistryError};
use crate::strategy::StrategySelector;

pub struct JobProcessor {
    registry: Arc<JobRegistry>,
    limiter: Arc<ConcurrencyLimiter>,
    selector: StrategySelector,
    supervisor: TimeoutSupervisor,
}

impl JobProcessor {
    pub fn new(
        registry: Arc<JobRegistry>,
        limiter: Arc<ConcurrencyLimiter>,
        selector: StrategySelector,
        supervisor: TimeoutSupervisor,
    ) -> Self {
        Self {
            registry,
            limiter,
            selector,
            supervisor,
        }
    }

    /// Admit, run and finalize one job, returning it in its terminal state
    pub async fn execute(&self, id: Uuid) -> Result<Job, RegistryError> {
        let queued = self.registry.lookup(id).ok_or(RegistryError::NotFound(id))?;

        let _permit = match self.limiter.acquire(queued.variant).await {
            Ok(permit) => permit,
            Err(e) => return self.reject(id, &e.to_string()),
        };

        let clock = Instant::now();
        let job = self.registry.begin(id, Utc::now())?;
        tracing::info!(
            job_id = %id,
            variant = %job.variant,
            category = %job.category,
            "Job processing started"
        );

        let outcome = match self.selector.select(job.variant) {
            Ok(strategy) => self.supervisor.supervise(strategy, &job.category).await,
            Err(e) => RunOutcome::Failed {
                error: e.to_string(),
                records: Vec::new(),
            },
        };

        let elapsed = clock.elapsed();
        let verdict =
            Verdict::from_outcome(outcome, elapsed, self.supervisor.settings().max_duration);
        let job = self.registry.finalize(
            id,
            Completion {
                status: verdict.status,
                records: verdict.records,
                error: verdict.error,
                finished_at: Utc::now(),
                duration_secs: elapsed.as_secs_f64(),
            },
        )?;

        match &job.error {
            Some(error) => tracing::warn!(
                job_id = %id,
                status = %job.status,
                records = job.records.len(),
                duration = elapsed.as_secs_f64(),
                error = %error,
                "Job finished"
            ),
            None => tracing::info!(
                job_id = %id,
                status = %job.status,
                records = job.records.len(),
                duration = elapsed.as_secs_f64(),
                "Job finished"
            ),
        }

        Ok(job)
    }

    /// Finalize a queued job as `error` without running it
    pub fn reject(&self, id: Uuid, reason: &str) -> Result<Job, RegistryError> {
        tracing::warn!(job_id = %id, reason, "Job rejected before execution");
        self.registry.begin(id, Utc::now())?;
        self.registry.finalize(
            id,
            Completion {
                status: JobStatus::Error,
                records: Vec::new(),
                error: Some(reason.to_string()),
                finished_at: Utc::now(),
                duration_secs: 0.0,
            },
        )
    }
}
