//! Quarry Core
//!
//! Core types shared by every Quarry crate.
//!
//! This crate contains:
//! - Domain types: the scraping job, its status machine and the strategy variants
//! - DTOs: request and response bodies exchanged over HTTP

pub mod domain;
pub mod dto;
