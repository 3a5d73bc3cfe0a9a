//! Data Transfer Objects for the HTTP front door
//!
//! DTOs are the shapes sent over the wire. Domain entities are converted into
//! them at the edge so the orchestrator can keep internal bookkeeping private.

pub mod catalog;
pub mod job;
pub mod queue;

/// Round a number of seconds to two decimals for display
pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
