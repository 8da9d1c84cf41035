//! # tlcache
//!
//! A multi-tier translation cache and language detection core: request
//! fingerprinting, layered storage (in-memory L1, remote L2, durable L3),
//! four eviction policies, and a two-stage language detector with its own
//! detection cache.
//!
//! This crate is a thin facade over [`tlcache_core`]: it re-exports the
//! types a hosting service needs to wire up a [`Coordinator`] and does not
//! add behavior of its own. Configuration loading, HTTP routing, and the
//! translation model backends that actually produce translations are the
//! hosting service's responsibility (see `tlcache_core::api` for the wire
//! contracts it should expose).
//!
//! ## Quick start
//!
//! ```
//! use tlcache::{Coordinator, CoordinatorConfig, Entry};
//!
//! let coordinator = Coordinator::new(CoordinatorConfig::default(), None, None);
//! let entry = Entry::new("en:fr:abc123", "hello", "en", "fr", "bonjour", 0.95, 3_600_000);
//! coordinator.set(entry).unwrap();
//!
//! match coordinator.get("en:fr:abc123").unwrap() {
//!     tlcache::GetOutcome::Hit(entry) => assert_eq!(entry.translation, "bonjour"),
//!     tlcache::GetOutcome::Miss => unreachable!(),
//! }
//! ```

pub use tlcache_core::api;
pub use tlcache_core::config;
pub use tlcache_core::detect;
pub use tlcache_core::durable;
pub use tlcache_core::entry_store;
pub use tlcache_core::eviction;
pub use tlcache_core::fingerprint;
pub use tlcache_core::metrics;
pub use tlcache_core::remote;

pub use tlcache_core::{CacheError, Coordinator, CoordinatorConfig, Entry, GetOutcome, Result};
