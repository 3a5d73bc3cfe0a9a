//! Scripted collaborators for tests
//!
//! Deterministic stand-ins for the article source, the exporter and the
//! notifier. Timing comes from `tokio::time`, so tests can run on paused time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use quarry_core::domain::job::{Job, Record};
use quarry_core::dto::job::CompletionNotice;

use crate::delivery::{ExportError, Notifier, NotifyError, ResultExporter};
use crate::source::{ArticleLink, ArticleSource, SourceError};

/// Source with a fixed number of units, each taking `delay` to extract
pub struct ScriptedSource {
    units: usize,
    delay: Duration,
    fatal_at: Option<usize>,
    recoverable_at: Option<usize>,
    panic_at: Option<usize>,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(units: usize, delay: Duration) -> Self {
        Self {
            units,
            delay,
            fatal_at: None,
            recoverable_at: None,
            panic_at: None,
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Unit `index` answers like a blocked request
    pub fn fail_fatally_at(mut self, index: usize) -> Self {
        self.fatal_at = Some(index);
        self
    }

    /// Unit `index` answers like a missing page
    pub fn fail_recoverably_at(mut self, index: usize) -> Self {
        self.recoverable_at = Some(index);
        self
    }

    /// Unit `index` panics
    pub fn panic_at(mut self, index: usize) -> Self {
        self.panic_at = Some(index);
        self
    }

    /// How many extractions began
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Highest number of extractions running at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArticleSource for ScriptedSource {
    async fn discover(&self, category: &str) -> Result<Vec<ArticleLink>, SourceError> {
        Ok((0..self.units)
            .map(|i| ArticleLink::new(format!("scripted://{category}/{i}")))
            .collect())
    }

    async fn extract(&self, link: &ArticleLink) -> Result<Option<Record>, SourceError> {
        let index: usize = link
            .url
            .rsplit('/')
            .next()
            .and_then(|tail| tail.parse().ok())
            .ok_or_else(|| SourceError::Parse {
                url: link.url.clone(),
                reason: "not a scripted link".into(),
            })?;

        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tokio::time::sleep(self.delay).await;

        if self.panic_at == Some(index) {
            panic!("scripted panic at unit {index}");
        }
        if self.fatal_at == Some(index) {
            return Err(SourceError::Status {
                url: link.url.clone(),
                status: 403,
            });
        }
        if self.recoverable_at == Some(index) {
            return Err(SourceError::Status {
                url: link.url.clone(),
                status: 404,
            });
        }

        let mut record = Record::new();
        record.insert("index".into(), index.into());
        record.insert("url".into(), link.url.clone().into());
        Ok(Some(record))
    }
}

#[derive(Debug, Clone, Copy)]
enum ExportMode {
    Succeed,
    FailTransient(usize),
    Reject,
}

/// Exporter that keeps every exported job in memory
pub struct RecordingExporter {
    mode: ExportMode,
    attempts: AtomicUsize,
    exported: Mutex<Vec<Job>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::with_mode(ExportMode::Succeed)
    }

    /// Fail with a transient error on the first `times` attempts
    pub fn failing_times(times: usize) -> Self {
        Self::with_mode(ExportMode::FailTransient(times))
    }

    /// Fail every attempt with a transient error
    pub fn failing_always() -> Self {
        Self::with_mode(ExportMode::FailTransient(usize::MAX))
    }

    /// Fail every attempt with a permanent error
    pub fn rejecting() -> Self {
        Self::with_mode(ExportMode::Reject)
    }

    fn with_mode(mode: ExportMode) -> Self {
        Self {
            mode,
            attempts: AtomicUsize::new(0),
            exported: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn exported(&self) -> Vec<Job> {
        self.exported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reference handed out for a job
    pub fn reference_for(job: &Job) -> String {
        format!("memory://exports/{}", job.id)
    }
}

impl Default for RecordingExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultExporter for RecordingExporter {
    async fn export(&self, job: &Job) -> Result<String, ExportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ExportMode::FailTransient(times) if attempt < times => {
                Err(ExportError::Io(std::io::Error::other(format!(
                    "attempt {}",
                    attempt + 1
                ))))
            }
            ExportMode::Reject => Err(ExportError::Rejected("scripted rejection".into())),
            _ => {
                self.exported
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(job.clone());
                Ok(Self::reference_for(job))
            }
        }
    }
}

/// Notifier that records every delivery attempt
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    delivered: Mutex<Vec<(String, CompletionNotice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery is recorded and then reported as failed
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<(String, CompletionNotice)> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, target: &str, notice: &CompletionNotice) -> Result<(), NotifyError> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.to_string(), notice.clone()));
        if self.fail {
            return Err(NotifyError::Status(500));
        }
        Ok(())
    }
}
