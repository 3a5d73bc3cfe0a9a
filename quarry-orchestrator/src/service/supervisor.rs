//! Timeout supervisor
//!
//! Races a strategy run against its deadline (the maximum duration minus a
//! safety margin) and the process shutdown signal. When the deadline wins the
//! strategy is cancelled and its partial output harvested on the spot; the run
//! then gets a short grace period to wind down before it is dropped.
//!
//! A second, post-hoc check in [`Verdict::from_outcome`] demotes any job whose
//! measured duration reached the maximum to `partial`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use quarry_core::domain::job::{JobStatus, Record};
use tokio_util::sync::CancellationToken;

use crate::strategy::{Strategy, panic_message};

/// Deadline tuning
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Hard ceiling on a job's processing time
    pub max_duration: Duration,

    /// Subtracted from the maximum to get the race deadline
    pub safety_margin: Duration,

    /// How long a cancelled run may keep going before it is dropped
    pub cancel_grace: Duration,
}

impl SupervisorSettings {
    pub fn deadline(&self) -> Duration {
        self.max_duration.saturating_sub(self.safety_margin)
    }
}

/// How a supervised run ended
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Vec<Record>),
    TimedOut(Vec<Record>),
    Interrupted(Vec<Record>),
    Failed { error: String, records: Vec<Record> },
}

/// Terminal status, records and message for a job
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: JobStatus,
    pub records: Vec<Record>,
    pub error: Option<String>,
}

impl Verdict {
    /// Map an outcome to a terminal status, then apply the duration override
    ///
    /// Reaching `max_duration` always yields `partial`, whatever the outcome.
    pub fn from_outcome(outcome: RunOutcome, elapsed: Duration, max_duration: Duration) -> Self {
        let mut verdict = match outcome {
            RunOutcome::Completed(records) => Verdict {
                status: JobStatus::Completed,
                records,
                error: None,
            },
            RunOutcome::TimedOut(records) => Verdict {
                status: JobStatus::Partial,
                records,
                error: Some("Timeout: returning partial results".to_string()),
            },
            RunOutcome::Interrupted(records) => Verdict {
                status: JobStatus::Partial,
                records,
                error: Some("Interrupted by shutdown: returning partial results".to_string()),
            },
            RunOutcome::Failed { error, records } => Verdict {
                status: JobStatus::Error,
                records,
                error: Some(error),
            },
        };

        if elapsed >= max_duration {
            verdict.status = JobStatus::Partial;
            verdict.error = Some(format!(
                "Timeout: returning partial results (duration: {:.2}s)",
                elapsed.as_secs_f64()
            ));
        }
        verdict
    }
}

enum Cutoff {
    Deadline,
    Shutdown,
}

pub struct TimeoutSupervisor {
    settings: SupervisorSettings,
    shutdown: CancellationToken,
}

impl TimeoutSupervisor {
    pub fn new(settings: SupervisorSettings, shutdown: CancellationToken) -> Self {
        Self { settings, shutdown }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Run `strategy` over `category` under the deadline
    pub async fn supervise(&self, strategy: Arc<dyn Strategy>, category: &str) -> RunOutcome {
        // Separate from the shutdown token so a shutdown is seen here first
        let cancel = CancellationToken::new();
        let run = AssertUnwindSafe(strategy.run(category, cancel.clone())).catch_unwind();
        tokio::pin!(run);

        let cutoff = tokio::select! {
            biased;
            result = &mut run => {
                return match result {
                    Ok(Ok(records)) => RunOutcome::Completed(records),
                    Ok(Err(e)) => RunOutcome::Failed {
                        error: e.to_string(),
                        records: strategy.partial(),
                    },
                    Err(panic) => RunOutcome::Failed {
                        error: format!("strategy panicked: {}", panic_message(panic.as_ref())),
                        records: strategy.partial(),
                    },
                };
            }
            _ = tokio::time::sleep(self.settings.deadline()) => Cutoff::Deadline,
            _ = self.shutdown.cancelled() => Cutoff::Shutdown,
        };

        cancel.cancel();
        let records = strategy.partial();
        tracing::debug!(category, records = records.len(), "Strategy cancelled, partial results harvested");

        if tokio::time::timeout(self.settings.cancel_grace, &mut run)
            .await
            .is_err()
        {
            tracing::warn!(category, "Strategy ignored cancellation, dropping it");
        }

        match cutoff {
            Cutoff::Deadline => RunOutcome::TimedOut(records),
            Cutoff::Shutdown => RunOutcome::Interrupted(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{SequentialStrategy, StrategyError};
    use crate::testing::ScriptedSource;
    use async_trait::async_trait;
    use quarry_core::domain::variant::Variant;

    fn settings(max_secs: u64) -> SupervisorSettings {
        SupervisorSettings {
            max_duration: Duration::from_secs(max_secs),
            safety_margin: Duration::from_secs(1),
            cancel_grace: Duration::from_millis(100),
        }
    }

    fn sequential(units: usize, delay_ms: u64) -> Arc<dyn Strategy> {
        Arc::new(SequentialStrategy::new(Arc::new(ScriptedSource::new(
            units,
            Duration::from_millis(delay_ms),
        ))))
    }

    /// Ignores cancellation and panics halfway
    struct Exploding;

    #[async_trait]
    impl Strategy for Exploding {
        fn variant(&self) -> Variant {
            Variant::Concurrent
        }

        async fn run(
            &self,
            _category: &str,
            _cancel: CancellationToken,
        ) -> Result<Vec<Record>, StrategyError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            panic!("exploded");
        }

        fn partial(&self) -> Vec<Record> {
            vec![Record::new()]
        }
    }

    /// Never returns and never looks at its token
    struct Stubborn;

    #[async_trait]
    impl Strategy for Stubborn {
        fn variant(&self) -> Variant {
            Variant::Bounded
        }

        async fn run(
            &self,
            _category: &str,
            _cancel: CancellationToken,
        ) -> Result<Vec<Record>, StrategyError> {
            std::future::pending().await
        }

        fn partial(&self) -> Vec<Record> {
            Vec::new()
        }
    }

    #[test]
    fn test_deadline_is_max_minus_margin() {
        assert_eq!(settings(5).deadline(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_before_deadline() {
        let supervisor = TimeoutSupervisor::new(settings(5), CancellationToken::new());
        let outcome = supervisor.supervise(sequential(10, 200), "pymes").await;
        assert!(matches!(outcome, RunOutcome::Completed(ref r) if r.len() == 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_harvests_partial() {
        let supervisor = TimeoutSupervisor::new(settings(5), CancellationToken::new());
        let started = tokio::time::Instant::now();

        let outcome = supervisor.supervise(sequential(10, 700), "pymes").await;

        assert!(matches!(outcome, RunOutcome::TimedOut(ref r) if r.len() == 5));
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stubborn_strategy_is_dropped_after_grace() {
        let supervisor = TimeoutSupervisor::new(settings(2), CancellationToken::new());
        let started = tokio::time::Instant::now();

        let outcome = supervisor.supervise(Arc::new(Stubborn), "pymes").await;

        assert!(matches!(outcome, RunOutcome::TimedOut(_)));
        assert!(started.elapsed() >= Duration::from_millis(1100));
        assert!(started.elapsed() < Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_becomes_failure() {
        let supervisor = TimeoutSupervisor::new(settings(5), CancellationToken::new());
        let outcome = supervisor.supervise(Arc::new(Exploding), "pymes").await;

        match outcome {
            RunOutcome::Failed { error, records } => {
                assert_eq!(error, "strategy panicked: exploded");
                assert_eq!(records.len(), 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts() {
        let shutdown = CancellationToken::new();
        let supervisor = TimeoutSupervisor::new(settings(60), shutdown.clone());

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(450)).await;
            trigger.cancel();
        });

        let outcome = supervisor.supervise(sequential(10, 200), "pymes").await;
        assert!(matches!(outcome, RunOutcome::Interrupted(ref r) if r.len() == 2));
    }

    #[test]
    fn test_duration_override_demotes_any_outcome() {
        let max = Duration::from_secs(5);
        let completed = Verdict::from_outcome(
            RunOutcome::Completed(vec![Record::new()]),
            Duration::from_millis(5000),
            max,
        );
        assert_eq!(completed.status, JobStatus::Partial);
        assert_eq!(
            completed.error.as_deref(),
            Some("Timeout: returning partial results (duration: 5.00s)")
        );
        assert_eq!(completed.records.len(), 1);

        let failed = Verdict::from_outcome(
            RunOutcome::Failed {
                error: "blocked".into(),
                records: Vec::new(),
            },
            Duration::from_secs(6),
            max,
        );
        assert_eq!(failed.status, JobStatus::Partial);
    }

    #[test]
    fn test_outcomes_below_maximum() {
        let max = Duration::from_secs(5);
        let elapsed = Duration::from_millis(4999);

        let done = Verdict::from_outcome(RunOutcome::Completed(Vec::new()), elapsed, max);
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.error.is_none());

        let timed_out = Verdict::from_outcome(RunOutcome::TimedOut(Vec::new()), elapsed, max);
        assert_eq!(timed_out.status, JobStatus::Partial);
        assert_eq!(timed_out.error.as_deref(), Some("Timeout: returning partial results"));

        let failed = Verdict::from_outcome(
            RunOutcome::Failed {
                error: "HTTP 403".into(),
                records: vec![Record::new(); 3],
            },
            elapsed,
            max,
        );
        assert_eq!(failed.status, JobStatus::Error);
        assert_eq!(failed.records.len(), 3);
    }
}
