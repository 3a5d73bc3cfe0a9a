//! Service Module
//!
//! Business logic layer for the orchestrator: admission, supervised
//! execution, dispatch and post-processing of scraping jobs.

pub mod admission;
pub mod completion;
pub mod dispatch;
pub mod job;
pub mod processor;
pub mod supervisor;

// Re-export for convenience
pub use admission::{AdmissionError, AdmissionPermit, ConcurrencyLimiter};
pub use completion::{CompletionPipeline, CompletionReport, Notification, RetryPolicy};
pub use dispatch::Dispatcher;
pub use job as job_service;
pub use job::{JobError, JobService};
pub use processor::JobProcessor;
pub use supervisor::{RunOutcome, SupervisorSettings, TimeoutSupervisor, Verdict};
