//! The L1 in-memory entry store (spec §4.2).
//!
//! Adapted from the teacher's `GlobalCache<R>`: the same multi-phase
//! locking strategy (a cheap read-lock lookup for the common case, a
//! write-lock only when an entry must be removed or mutated) carried over
//! from `global_cache.rs`, now operating on the concrete `Entry` type
//! instead of a generic `CacheEntry<R>`, and replacing the static
//! `Lazy<RwLock<..>>` globals with an owned, instantiable store so a
//! process can run more than one.

use crate::config::EntryStoreConfig;
use crate::entry::{now_ms, Entry};
use crate::eviction::EvictionPolicy;
use crate::metrics::Metrics;
use crate::utils;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};

/// Whether [`EntryStore::add`] created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Updated,
}

/// Thread-safe L1 cache: a bounded map of fingerprint to [`Entry`], backed
/// by one of the four eviction policies (spec §4.3).
pub struct EntryStore {
    map: RwLock<HashMap<String, Entry>>,
    order: Mutex<VecDeque<String>>,
    config: RwLock<EntryStoreConfig>,
    metrics: Metrics,
}

impl EntryStore {
    pub fn new(config: EntryStoreConfig) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            config: RwLock::new(config),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> EntryStoreConfig {
        self.config.read().clone()
    }

    pub fn set_eviction_policy(&self, policy: EvictionPolicy) {
        self.config.write().eviction_policy = policy;
    }

    /// Inserts or replaces an entry, then evicts down to `max_entries` if
    /// the insert pushed the store over capacity (spec §3 invariant 4: the
    /// cap holds as an atomic critical section, never observable as exceeded).
    pub fn add(&self, entry: Entry) -> AddOutcome {
        let cfg = self.config.read().clone();
        let mut map = self.map.write();
        let mut order = self.order.lock();

        let outcome = if map.contains_key(&entry.key) {
            AddOutcome::Updated
        } else {
            AddOutcome::Inserted
        };

        let key = entry.key.clone();
        map.insert(key.clone(), entry);
        if let Some(pos) = order.iter().position(|k| k == &key) {
            order.remove(pos);
        }
        order.push_back(key);

        while map.len() > cfg.max_entries {
            match cfg.eviction_policy.pick_victim(&map, &order) {
                Some(victim) => {
                    utils::remove_key(&mut map, &mut order, &victim);
                    self.metrics.record_eviction();
                }
                None => break,
            }
        }

        self.metrics.set_current_size(map.len());
        outcome
    }

    /// Looks up `key`, lazily expiring it if its TTL has elapsed (spec
    /// §4.4), bumping `usage_count`/`last_used` on a hit, and auto-extending
    /// the TTL when the store is configured to and the residual TTL has
    /// dropped below the configured threshold.
    pub fn find(&self, key: &str) -> Option<Entry> {
        let now = now_ms();
        let cfg = self.config.read().clone();

        let expired = {
            let map = self.map.read();
            match map.get(key) {
                None => {
                    self.metrics.record_miss(0.0);
                    return None;
                }
                Some(e) => e.is_expired(now, cfg.default_ttl_ms),
            }
        };

        if expired {
            let mut map = self.map.write();
            let mut order = self.order.lock();
            utils::remove_key(&mut map, &mut order, key);
            self.metrics.set_current_size(map.len());
            self.metrics.record_miss(0.0);
            return None;
        }

        let result = {
            let mut map = self.map.write();
            map.get_mut(key).map(|e| {
                e.record_access(now);
                if cfg.auto_extend_ttl {
                    let residual = e
                        .effective_ttl(cfg.default_ttl_ms)
                        .saturating_sub(now.saturating_sub(e.timestamp));
                    if residual < cfg.ttl_extend_threshold_ms {
                        extend_entry_ttl(e, &cfg, cfg.ttl_extension_ms);
                    }
                }
                e.clone()
            })
        };

        if result.is_some() {
            cfg.eviction_policy.on_access(&mut self.order.lock(), key);
            self.metrics.record_hit(0.0);
        } else {
            self.metrics.record_miss(0.0);
        }
        result
    }

    /// Extends `key`'s TTL by `additional_ms`, capped at
    /// `default_ttl_ms + max_ttl_extension_ms` total (spec §4.4). Returns
    /// `false` if the key isn't present.
    pub fn extend_ttl(&self, key: &str, additional_ms: u64) -> bool {
        let cfg = self.config.read().clone();
        let mut map = self.map.write();
        match map.get_mut(key) {
            Some(e) => {
                extend_entry_ttl(e, &cfg, additional_ms);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut map = self.map.write();
        let mut order = self.order.lock();
        let removed = utils::remove_key(&mut map, &mut order, key);
        self.metrics.set_current_size(map.len());
        removed
    }

    /// Evicts one batch of victims (`eviction_batch_size` entries) under
    /// the configured policy, regardless of whether the store is at
    /// capacity. Returns the number actually evicted.
    pub fn evict_batch(&self) -> usize {
        let cfg = self.config.read().clone();
        let mut map = self.map.write();
        let mut order = self.order.lock();
        let victims = cfg
            .eviction_policy
            .pick_victims(&map, &order, cfg.eviction_batch_size);
        for victim in &victims {
            utils::remove_key(&mut map, &mut order, victim);
            self.metrics.record_eviction();
        }
        self.metrics.set_current_size(map.len());
        victims.len()
    }

    /// Sweeps and removes every expired entry at zero eviction-policy cost
    /// (spec §4.3: expired entries are harvested before policy-based
    /// eviction runs, since removing them is free and always correct).
    pub fn clear_expired(&self) -> usize {
        let now = now_ms();
        let cfg = self.config.read().clone();
        let mut map = self.map.write();
        let mut order = self.order.lock();

        let expired: Vec<String> = map
            .iter()
            .filter(|(_, e)| e.is_expired(now, cfg.default_ttl_ms))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            utils::remove_key(&mut map, &mut order, key);
        }
        self.metrics.set_current_size(map.len());
        expired.len()
    }

    pub fn clear(&self) {
        self.map.write().clear();
        self.order.lock().clear();
        self.metrics.set_current_size(0);
    }

    pub fn count(&self) -> usize {
        self.map.read().len()
    }

    pub fn capacity(&self) -> usize {
        self.config.read().max_entries
    }

    pub fn usage_percent(&self) -> f64 {
        let cap = self.capacity();
        if cap == 0 {
            0.0
        } else {
            self.count() as f64 / cap as f64
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn extend_entry_ttl(e: &mut Entry, cfg: &EntryStoreConfig, additional_ms: u64) {
    let base = cfg.default_ttl_ms;
    let current_effective = e.effective_ttl(base);
    let max_allowed = base.saturating_add(cfg.max_ttl_extension_ms);
    e.ttl = current_effective.saturating_add(additional_ms).min(max_allowed);
}
