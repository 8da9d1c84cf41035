//! Multi-tier orchestration: read-through with promotion, write-through,
//! and aggregate reporting across L1/L2/L3 (spec §4.8).
//!
//! Grounded on `other_examples/c09d3413_nstefan-yastwai`'s `TranslationCache`
//! (L1-then-L2 lookup, promote-on-hit, best-effort second tier) extended
//! with the L3 durable tier and the absorb/surface error policy spec §7
//! assigns per error kind, and on the teacher's pattern of a thin owning
//! struct wiring together already-built collaborators rather than inlining
//! their logic.

use crate::config::CoordinatorConfig;
use crate::durable::DurableStore;
use crate::entry::Entry;
use crate::entry_store::EntryStore;
use crate::error::{CacheError, Result};
use crate::metrics::{self, MetricsSnapshot};
use crate::remote::RemoteCache;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of a coordinated `get` (spec §4.8 `get(key) -> Hit | Miss | Error`).
#[derive(Debug, Clone)]
pub enum GetOutcome {
    Hit(Entry),
    Miss,
}

/// Orchestrates the L1 entry store, the optional L2 remote cache, and the
/// optional L3 durable store behind one `get`/`set`/`update`/`delete`
/// surface (spec §4.8).
pub struct Coordinator {
    l1: EntryStore,
    l2: Option<Arc<dyn RemoteCache>>,
    l3: Option<DurableStore>,
    config: RwLock<CoordinatorConfig>,
    quiesced: AtomicBool,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig, l2: Option<Arc<dyn RemoteCache>>, l3: Option<DurableStore>) -> Self {
        let l1 = EntryStore::new(config.entry_store.clone());
        Self {
            l1,
            l2,
            l3,
            config: RwLock::new(config),
            quiesced: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> CoordinatorConfig {
        self.config.read().clone()
    }

    /// `get` protocol (spec §4.8): L1, then L2 with promotion to L1, then
    /// L3 with promotion to L2 and L1, else `Miss`. Promotion reuses the
    /// source entry's remaining TTL rather than issuing a fresh one.
    pub fn get(&self, key: &str) -> Result<GetOutcome> {
        if let Some(entry) = self.l1.find(key) {
            return Ok(GetOutcome::Hit(entry));
        }

        if let Some(l2) = &self.l2 {
            match l2.get(key) {
                Ok(Some(entry)) => {
                    self.promote_to_l1(&entry);
                    return Ok(GetOutcome::Hit(entry));
                }
                Ok(None) => {}
                Err(e) if e.is_degradable_on_read() => {
                    tracing::warn!(%key, error = %e, "L2 unavailable on read, falling through");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(l3) = &self.l3 {
            match l3.load_latest() {
                Ok(entries) => {
                    if let Some(entry) = entries.into_iter().find(|e| e.key == key) {
                        self.promote_to_l2(&entry);
                        self.promote_to_l1(&entry);
                        return Ok(GetOutcome::Hit(entry));
                    }
                }
                Err(e) if e.is_degradable_on_read() => {
                    tracing::warn!(%key, error = %e, "L3 unavailable on read, falling through");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(GetOutcome::Miss)
    }

    fn promote_to_l1(&self, entry: &Entry) {
        self.l1.add(entry.clone());
    }

    /// Promotes `entry` into L2 with its *remaining* TTL, not a fresh one
    /// (spec §4.8: "Promotion uses the source entry's remaining TTL"). An
    /// entry whose remaining TTL has already hit zero is not promoted.
    fn promote_to_l2(&self, entry: &Entry) {
        if let Some(l2) = &self.l2 {
            let default_ttl_ms = self.config.read().entry_store.default_ttl_ms;
            let effective_ttl_ms = entry.effective_ttl(default_ttl_ms);
            let elapsed_ms = crate::entry::now_ms().saturating_sub(entry.timestamp);
            let remaining_ms = effective_ttl_ms.saturating_sub(elapsed_ms);
            if remaining_ms == 0 {
                return;
            }
            let ttl_secs = (remaining_ms / 1000).max(1);
            if let Err(e) = l2.set(&entry.key, entry, ttl_secs) {
                tracing::warn!(key = %entry.key, error = %e, "L2 promotion failed");
            }
        }
    }

    /// `set` protocol (spec §4.8): L1 write is authoritative for the
    /// caller; L2/L3 writes are best-effort and their failures are logged,
    /// never surfaced.
    pub fn set(&self, entry: Entry) -> Result<()> {
        self.l1.add(entry.clone());

        if let Some(l2) = &self.l2 {
            let ttl_secs = entry.ttl / 1000;
            if let Err(e) = l2.set(&entry.key, &entry, ttl_secs) {
                tracing::warn!(key = %entry.key, error = %e, "L2 write-through failed");
            }
        }

        if let Some(l3) = &self.l3 {
            let should_flush = l3.stage(entry);
            if should_flush {
                if let Err(e) = l3.flush() {
                    tracing::warn!(error = %e, "L3 auto-flush failed");
                }
            }
        }

        Ok(())
    }

    /// Equivalent to `set` (spec §4.8: "`update` is equivalent to `set` on
    /// tiers that do upsert-on-write").
    pub fn update(&self, entry: Entry) -> Result<()> {
        self.set(entry)
    }

    /// Removes `key` from all three tiers. Idempotent: deleting an absent
    /// key is not an error. The L3 removal is staged as a tombstone and
    /// flushed immediately, since `get`'s L3 fallback reads only the most
    /// recently committed snapshot and would otherwise resurrect the key.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.l1.remove(key);
        if let Some(l2) = &self.l2 {
            if let Err(e) = l2.delete(key) {
                tracing::warn!(%key, error = %e, "L2 delete failed");
            }
        }
        if let Some(l3) = &self.l3 {
            l3.stage_delete(key);
            if let Err(e) = l3.flush() {
                tracing::warn!(%key, error = %e, "L3 delete flush failed");
            }
        }
        Ok(())
    }

    /// Consumes up to `count` entries from a frequency-sorted candidate
    /// stream and `set`s each one (spec §4.8 "cache warming"). Stops early
    /// if the stream is shorter than `count`.
    pub fn warm(&self, source: impl IntoIterator<Item = Entry>, count: usize) -> usize {
        let mut warmed = 0;
        for entry in source.into_iter().take(count) {
            if self.set(entry).is_ok() {
                warmed += 1;
            }
        }
        warmed
    }

    /// Sweeps expired entries from L1. L2/L3 rely on their own native TTL
    /// and batch lifecycle respectively, so only L1 needs an explicit sweep.
    pub fn evict_expired_all(&self) -> usize {
        self.l1.clear_expired()
    }

    /// Aggregates L1's metrics with any L2/L3 metrics a deployment wires in
    /// (spec §4.8: "sum per-tier counters and compute weighted averages").
    pub fn metrics(&self) -> MetricsSnapshot {
        metrics::aggregate(&[self.l1.metrics().snapshot()])
    }

    /// Flushes any pending L3 writes (spec §4.6 "`deinit` with
    /// `pending_changes > 0` MUST flush").
    pub fn flush(&self) -> Result<usize> {
        match &self.l3 {
            Some(l3) => l3.flush(),
            None => Ok(0),
        }
    }

    /// Stops accepting new background work so a backup can run against a
    /// consistent snapshot (spec §4.7 "Coordinator is quiesced").
    pub fn quiesce(&self) {
        self.quiesced.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.quiesced.store(false, Ordering::SeqCst);
    }

    pub fn is_quiesced(&self) -> bool {
        self.quiesced.load(Ordering::SeqCst)
    }
}

/// Maps a propagated [`CacheError`] to the surface/absorb decision spec §7
/// assigns it on a write path: unlike reads, write-path tier failures are
/// always logged and absorbed except for kinds that indicate a fundamentally
/// invalid operation (`InvalidInput`, `SchemaTooNew`).
pub fn should_surface_on_write(err: &CacheError) -> bool {
    matches!(err, CacheError::InvalidInput(_) | CacheError::SchemaTooNew { .. })
}
