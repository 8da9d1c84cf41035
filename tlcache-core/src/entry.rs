//! The cache entry data model (spec §3).
//!
//! Adapted from the teacher's `CacheEntry<R>` wrapper (insertion timestamp +
//! access frequency, used for TTL and LFU bookkeeping) but made concrete:
//! this crate caches translations specifically, not an arbitrary `R`, so
//! `Entry` carries the full translation payload rather than wrapping a
//! generic value.

use std::time::{SystemTime, UNIX_EPOCH};

/// Entry flag: this translation was produced by a cloud/remote model rather
/// than on-device.
pub const FLAG_CLOUD_ORIGIN: u32 = 1 << 0;
/// Entry flag: a human corrected this translation after it was produced.
pub const FLAG_USER_CORRECTED: u32 = 1 << 1;

/// Where a translation originated, for `metadata.origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntryOrigin {
    OnDeviceModel,
    CloudModel,
    UserCorrection,
}

/// Non-identifying bookkeeping carried alongside a translation (spec §3
/// `metadata`). A concrete struct, not an opaque pointer, per the design
/// note in spec §9 ("replace `void *metadata` with tagged variants").
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EntryMetadata {
    pub usage_count: u64,
    pub last_used: u64,
    pub context: Option<String>,
    pub origin: Option<EntryOrigin>,
    pub domain: Option<String>,
}

/// The unit of caching: a fingerprinted translation request/response pair.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    /// Stable fingerprint, bounded to [`crate::fingerprint::MAX_KEY_BYTES`] bytes.
    pub key: String,
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub translation: String,
    /// Quality claimed by the producer, in `[0, 1]`.
    pub confidence: f64,
    /// Creation time, ms since a fixed epoch (Unix epoch here).
    pub timestamp: u64,
    /// Lifetime in ms; `0` means "use the store's configured default".
    pub ttl: u64,
    pub flags: u32,
    pub metadata: EntryMetadata,
}

impl Entry {
    /// Builds a new entry with `timestamp` and `metadata.last_used` set to
    /// `now`, and `usage_count` at the minimum reachable value (spec §3
    /// invariant 2: `usage_count >= 1` for any reachable entry).
    pub fn new(
        key: impl Into<String>,
        source_text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        translation: impl Into<String>,
        confidence: f64,
        ttl: u64,
    ) -> Self {
        let now = now_ms();
        Self {
            key: key.into(),
            source_text: source_text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            translation: translation.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: now,
            ttl,
            flags: 0,
            metadata: EntryMetadata {
                usage_count: 1,
                last_used: now,
                ..Default::default()
            },
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32) {
        self.flags |= flag;
    }

    /// Effective TTL: the entry's own TTL, or `default_ttl_ms` when the
    /// entry's TTL is `0` ("use default", spec §3).
    pub fn effective_ttl(&self, default_ttl_ms: u64) -> u64 {
        if self.ttl == 0 {
            default_ttl_ms
        } else {
            self.ttl
        }
    }

    /// `true` when `now - timestamp > ttl` (spec §3 invariant 3 / §4.4).
    pub fn is_expired(&self, now: u64, default_ttl_ms: u64) -> bool {
        let ttl = self.effective_ttl(default_ttl_ms);
        now.saturating_sub(self.timestamp) > ttl
    }

    /// Records an access: bumps `usage_count` and `last_used` (spec §4.2).
    pub fn record_access(&mut self, now: u64) {
        self.metadata.usage_count = self.metadata.usage_count.saturating_add(1);
        self.metadata.last_used = now;
    }

    /// Observable fields compared by the round-trip property in spec §8
    /// universal 2 (`source_text, source_lang, target_lang, translation, ttl`).
    pub fn observable_eq(&self, other: &Entry) -> bool {
        self.source_text == other.source_text
            && self.source_lang == other.source_lang
            && self.target_lang == other.target_lang
            && self.translation == other.translation
            && self.ttl == other.ttl
    }
}

/// Milliseconds since the Unix epoch. The single clock source used
/// throughout this crate so tests can reason about `timestamp`/`last_used`
/// deltas without faking a custom epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}
