//! Core domain types
//!
//! These types represent the fundamental business entities and are shared between
//! the orchestrator (which owns and mutates jobs) and the client and CLI (which
//! only read them through DTOs).

pub mod job;
pub mod variant;
