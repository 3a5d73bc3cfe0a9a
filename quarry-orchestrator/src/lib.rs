//! Quarry Orchestrator
//!
//! Accepts scraping jobs, runs each one with the requested execution
//! strategy under a per-variant admission gate and a hard deadline, and keeps
//! a consistent view of every job for polling clients.

pub mod api;
pub mod app;
pub mod config;
pub mod delivery;
pub mod repository;
pub mod service;
pub mod source;
pub mod strategy;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use app::{Collaborators, Orchestrator};
pub use config::Config;
