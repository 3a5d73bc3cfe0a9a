//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Jobs live in memory for the lifetime of the process.

pub mod job;

// Re-export for convenience
pub use job as job_repository;
pub use job::{JobRegistry, RegistryError};
