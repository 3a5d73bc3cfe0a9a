//! Job Repository
//!
//! In-memory job registry: the pending queue plus the finished-jobs index.
//! It is the single source of truth for status reads. Every mutation happens
//! under one lock, so readers observe a job either before or after an update,
//! never halfway through.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use quarry_core::domain::job::{Completion, InvalidTransition, Job};
use quarry_core::dto::queue::{JobSummary, QueueStatus};
use uuid::Uuid;

/// Registry error type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id}: {source}")]
    InvalidState {
        id: Uuid,
        #[source]
        source: InvalidTransition,
    },
}

#[derive(Default)]
struct RegistryState {
    /// Jobs not yet finalized, in submission order
    queue: VecDeque<Job>,
    /// Finalized jobs, in finalization order
    finished: IndexMap<Uuid, Job>,
}

/// Pending queue and finished index behind a single lock
#[derive(Default)]
pub struct JobRegistry {
    state: RwLock<RegistryState>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly created job to the pending queue
    pub fn submit(&self, job: Job) {
        tracing::debug!(job_id = %job.id, variant = %job.variant, "Job queued");
        self.write().queue.push_back(job);
    }

    /// Find a job, searching the pending queue first and then the finished index
    pub fn lookup(&self, id: Uuid) -> Option<Job> {
        let state = self.read();
        state
            .queue
            .iter()
            .find(|job| job.id == id)
            .or_else(|| state.finished.get(&id))
            .cloned()
    }

    /// Mark a queued job as processing
    ///
    /// Only the worker that won admission calls this, so the start time is
    /// stamped at most once.
    pub fn begin(&self, id: Uuid, at: DateTime<Utc>) -> Result<Job, RegistryError> {
        let mut state = self.write();
        let job = state
            .queue
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or(RegistryError::NotFound(id))?;

        job.start(at)
            .map_err(|source| RegistryError::InvalidState { id, source })?;

        Ok(job.clone())
    }

    /// Apply the terminal outcome and move the job into the finished index
    ///
    /// Idempotent: finalizing an already finished job returns it unchanged.
    pub fn finalize(&self, id: Uuid, completion: Completion) -> Result<Job, RegistryError> {
        let mut state = self.write();

        if let Some(existing) = state.finished.get(&id) {
            tracing::debug!(job_id = %id, status = %existing.status, "Job already finalized");
            return Ok(existing.clone());
        }

        let position = state
            .queue
            .iter()
            .position(|job| job.id == id)
            .ok_or(RegistryError::NotFound(id))?;

        state.queue[position]
            .finish(completion)
            .map_err(|source| RegistryError::InvalidState { id, source })?;

        let job = state
            .queue
            .remove(position)
            .ok_or(RegistryError::NotFound(id))?;
        state.finished.insert(id, job.clone());

        Ok(job)
    }

    /// Group every known job by status as seen at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> QueueStatus {
        let state = self.read();
        let mut status = QueueStatus::default();
        for job in state.queue.iter().chain(state.finished.values()) {
            status.push(JobSummary::from_job(job, now));
        }
        status
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::domain::job::{JobStatus, Record};
    use quarry_core::domain::variant::Variant;
    use std::sync::Arc;

    fn job(variant: Variant) -> Job {
        Job::new("pymes", variant, None, None)
    }

    fn completion(status: JobStatus, records: usize) -> Completion {
        Completion {
            status,
            records: (0..records).map(|_| Record::new()).collect(),
            error: None,
            finished_at: Utc::now(),
            duration_secs: 0.25,
        }
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = JobRegistry::new();
        assert!(registry.lookup(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_begin_then_finalize() {
        let registry = JobRegistry::new();
        let job = job(Variant::Sequential);
        let id = job.id;
        registry.submit(job);

        let started = registry.begin(id, Utc::now()).unwrap();
        assert_eq!(started.status, JobStatus::Processing);
        assert_eq!(registry.lookup(id).unwrap().status, JobStatus::Processing);

        let done = registry.finalize(id, completion(JobStatus::Completed, 4)).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(registry.lookup(id).unwrap().records.len(), 4);
    }

    #[test]
    fn test_begin_twice_rejected() {
        let registry = JobRegistry::new();
        let job = job(Variant::Bounded);
        let id = job.id;
        registry.submit(job);

        registry.begin(id, Utc::now()).unwrap();
        assert!(matches!(
            registry.begin(id, Utc::now()),
            Err(RegistryError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_finalize_pending_rejected() {
        let registry = JobRegistry::new();
        let job = job(Variant::Bounded);
        let id = job.id;
        registry.submit(job);

        assert!(registry.finalize(id, completion(JobStatus::Error, 0)).is_err());
        assert_eq!(registry.lookup(id).unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let registry = JobRegistry::new();
        let job = job(Variant::Concurrent);
        let id = job.id;
        registry.submit(job);
        registry.begin(id, Utc::now()).unwrap();

        registry.finalize(id, completion(JobStatus::Partial, 2)).unwrap();
        let again = registry.finalize(id, completion(JobStatus::Completed, 9)).unwrap();

        assert_eq!(again.status, JobStatus::Partial);
        assert_eq!(again.records.len(), 2);
        let snapshot = registry.snapshot(Utc::now());
        assert_eq!(snapshot.finished_count, 1);
        assert_eq!(snapshot.pending_count + snapshot.processing_count, 0);
    }

    #[test]
    fn test_finalize_unknown() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.finalize(Uuid::new_v4(), completion(JobStatus::Error, 0)),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_groups_are_disjoint() {
        let registry = JobRegistry::new();
        let pending = job(Variant::Sequential);
        let running = job(Variant::Bounded);
        let finished = job(Variant::Concurrent);
        let (running_id, finished_id) = (running.id, finished.id);
        registry.submit(pending);
        registry.submit(running);
        registry.submit(finished);

        registry.begin(running_id, Utc::now()).unwrap();
        registry.begin(finished_id, Utc::now()).unwrap();
        registry
            .finalize(finished_id, completion(JobStatus::Completed, 3))
            .unwrap();

        let snapshot = registry.snapshot(Utc::now());
        assert_eq!(snapshot.pending_count, 1);
        assert_eq!(snapshot.processing_count, 1);
        assert_eq!(snapshot.finished_count, 1);
        assert!(snapshot.pending[0].waiting_time.is_some());
        assert_eq!(snapshot.processing[0].job_id, running_id);
        assert_eq!(snapshot.finished[0].record_count, Some(3));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_state() {
        let registry = Arc::new(JobRegistry::new());
        let job = job(Variant::Sequential);
        let id = job.id;
        registry.submit(job);
        registry.begin(id, Utc::now()).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let seen = registry.lookup(id).unwrap();
                        match seen.status {
                            JobStatus::Processing => {
                                assert!(seen.records.is_empty());
                                assert!(seen.finished_at.is_none());
                            }
                            JobStatus::Completed => {
                                assert_eq!(seen.records.len(), 5);
                                assert!(seen.finished_at.is_some());
                            }
                            other => panic!("unexpected status {other}"),
                        }
                    }
                })
            })
            .collect();

        registry.finalize(id, completion(JobStatus::Completed, 5)).unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
