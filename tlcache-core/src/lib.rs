//! # tlcache-core
//!
//! Core of a multi-tier translation cache and language detection engine.
//!
//! ## Module Organization
//!
//! - [`entry`] — the cached translation unit and its lifecycle fields
//! - [`fingerprint`] — deterministic request-to-key derivation
//! - [`eviction`] / [`utils`] — the four L1 eviction policies and their
//!   victim-selection helpers
//! - [`entry_store`] — the in-memory L1 tier
//! - [`remote`] — the L2 remote cache trait, wire format, and transport
//! - [`durable`] — the crash-safe L3 batch store and schema migration
//! - [`coordinator`] — multi-tier read-through/write-through orchestration
//! - [`detect`] — the language detection engine and its two-level cache
//! - [`metrics`] — per-tier counters and aggregate reporting
//! - [`config`] — typed configuration for every component above
//! - [`error`] — the crate-wide error taxonomy
//! - [`api`] — wire types for the hosting service's HTTP/JSON API

pub mod api;
pub mod config;
pub mod coordinator;
pub mod detect;
pub mod durable;
pub mod entry;
pub mod entry_store;
pub mod error;
pub mod eviction;
pub mod fingerprint;
pub mod metrics;
pub mod remote;
pub mod utils;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, GetOutcome};
pub use entry::Entry;
pub use error::{CacheError, Result};
