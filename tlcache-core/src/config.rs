//! Typed configuration structs.
//!
//! Loading these from a file, environment, or CLI flags is out of scope
//! for this crate (spec §1 Non-goals: "CLI and configuration loading" is an
//! external collaborator) — the hosting process builds one of these, by
//! whatever means it likes, and hands it to the relevant component. Every
//! struct derives `serde::Deserialize` so a TOML/JSON/YAML loader is a
//! direct `serde` call away, matching how `pcastone-orca`'s crates take
//! config as already-deserialized structs.

use crate::eviction::EvictionPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the in-memory L1 [`crate::entry_store::EntryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryStoreConfig {
    /// Hard cap on the number of live entries (spec §3 invariant 4).
    pub max_entries: usize,
    /// Number of victims to select per eviction batch (spec §4.3).
    pub eviction_batch_size: usize,
    /// Which of the four policies governs victim selection.
    pub eviction_policy: EvictionPolicy,
    /// Default TTL in milliseconds applied when an entry's `ttl` is `0`.
    pub default_ttl_ms: u64,
    /// When set, a live `find()` whose residual TTL is below
    /// `ttl_extend_threshold_ms` gets `ttl_extension_ms` added (spec §4.2).
    pub auto_extend_ttl: bool,
    pub ttl_extend_threshold_ms: u64,
    pub ttl_extension_ms: u64,
    /// Upper bound on how much `extend_ttl` may add to a single entry's TTL
    /// over its lifetime (spec §4.4 "a configured per-entry cap applies").
    pub max_ttl_extension_ms: u64,
    /// Background sweep interval for lazy + eager expiry (spec §4.4).
    pub cleanup_interval_ms: u64,
}

impl Default for EntryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            eviction_batch_size: 16,
            eviction_policy: EvictionPolicy::LRU,
            default_ttl_ms: 24 * 60 * 60 * 1000,
            auto_extend_ttl: false,
            ttl_extend_threshold_ms: 5 * 60 * 1000,
            ttl_extension_ms: 10 * 60 * 1000,
            max_ttl_extension_ms: 60 * 60 * 1000,
            cleanup_interval_ms: 60_000,
        }
    }
}

/// Configuration for fingerprint derivation (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Whether to normalize `source_text` before hashing.
    pub normalize_text: bool,
    /// Whether to use the 128-bit hash variant for extra collision resistance.
    pub use_wide_hash: bool,
    /// Whether to append `:<timestamp_ms>` to the key (cache-bypass use cases).
    pub include_timestamp_suffix: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            normalize_text: true,
            use_wide_hash: false,
            include_timestamp_suffix: false,
        }
    }
}

/// Configuration for the L2 remote cache ([`crate::remote::RemoteCache`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCacheConfig {
    /// Key prefix applied to every remote key (spec §6 default `tcl:`).
    pub key_prefix: String,
    /// Native TTL, in seconds, applied to every `SET ... EX`.
    pub default_ttl_secs: u64,
    /// Fixed connection pool size.
    pub pool_size: usize,
    /// Consecutive errors on one connection before it is retired and replaced.
    pub max_error_count: u32,
    /// Per-command timeout.
    pub command_timeout_ms: u64,
    /// How long a caller waits for a pooled connection before `Busy`.
    pub acquire_queue_timeout_ms: u64,
    /// Whether the transport should negotiate TLS.
    pub use_tls: bool,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "tcl:".to_string(),
            default_ttl_secs: 3600,
            pool_size: 8,
            max_error_count: 3,
            command_timeout_ms: 500,
            acquire_queue_timeout_ms: 200,
            use_tls: false,
        }
    }
}

/// Configuration for the [`crate::durable::DurableStore`] (L3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DurableStoreConfig {
    /// Root directory for `metadata.bin` and `batch_*.bin` files.
    pub storage_path: String,
    /// Whether a background/triggered auto-save runs at all.
    pub enable_auto_save: bool,
    /// Save at least this often when auto-save is enabled.
    pub auto_save_interval_ms: u64,
    /// Save immediately once this many uncommitted changes accumulate.
    pub max_batch_size: usize,
    /// Current code schema version; compared against `metadata.bin` at init.
    pub schema_version: u32,
}

impl Default for DurableStoreConfig {
    fn default() -> Self {
        Self {
            storage_path: "./tlcache-data".to_string(),
            enable_auto_save: true,
            auto_save_interval_ms: 30_000,
            max_batch_size: 500,
            schema_version: crate::durable::CURRENT_SCHEMA_VERSION,
        }
    }
}

/// Configuration for the multi-tier [`crate::coordinator::Coordinator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub entry_store: EntryStoreConfig,
    pub fingerprint: FingerprintConfig,
    pub remote: RemoteCacheConfig,
    pub durable: DurableStoreConfig,
    /// Deadline for a single remote-tier round trip before it surfaces `Timeout`.
    pub remote_deadline_ms: u64,
    /// Deadline for a single durable-tier operation before it surfaces `Timeout`.
    pub durable_deadline_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            entry_store: EntryStoreConfig::default(),
            fingerprint: FingerprintConfig::default(),
            remote: RemoteCacheConfig::default(),
            durable: DurableStoreConfig::default(),
            remote_deadline_ms: 250,
            durable_deadline_ms: 1000,
        }
    }
}

/// Configuration for the language detection engine (spec §4.9–§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum confidence the primary detector must clear before its result
    /// is returned rather than `LowConfidence`.
    pub min_confidence: f64,
    /// Exact-match L1 capacity in the detection cache.
    pub l1_capacity: usize,
    /// Weight applied to `access_count` in the L1 eviction score.
    pub frequency_weight: f64,
    /// Minimum cosine-style similarity for an L2 pattern match to count.
    pub pattern_match_threshold: f64,
    /// Minimum input length (chars) for pattern matching to be attempted.
    pub min_text_length_for_pattern_match: usize,
    /// Minimum confidence a result must reach before it is cached at all.
    pub min_confidence_for_cache: f64,
    /// How long an exact-cache entry stays valid before `lookup_exact`
    /// purges it on access, in milliseconds.
    pub cache_ttl_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            l1_capacity: 4096,
            frequency_weight: 50.0,
            pattern_match_threshold: 0.6,
            min_text_length_for_pattern_match: 8,
            min_confidence_for_cache: 0.4,
            cache_ttl_ms: 3_600_000,
        }
    }
}
