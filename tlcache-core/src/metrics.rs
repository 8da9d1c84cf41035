//! Per-tier and aggregate cache metrics (spec §4.7).
//!
//! Extends the teacher's `CacheStats` atomic-counter pattern (hits/misses
//! with `Relaxed` ordering, cheap `Clone` via a fresh set of atomics) with
//! the fields spec §4.7 asks every tier to expose: `evictions`,
//! `avg_response_time`, `current_size`, and a `peak_size` high-water mark.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters for one cache tier.
///
/// `avg_response_time` is maintained as a running mean updated on every
/// `record_hit`/`record_miss` call (`record_sample`), not recomputed from a
/// stored sum, so it stays O(1) per observation.
#[derive(Debug)]
pub struct Metrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    current_size: AtomicUsize,
    peak_size: AtomicUsize,
    // avg_response_time_us and its sample count packed as bits-of-f64 isn't
    // atomic-friendly, so the running mean is guarded by a narrow lock.
    response: parking_lot::Mutex<ResponseMean>,
}

#[derive(Debug, Default)]
struct ResponseMean {
    mean_us: f64,
    samples: u64,
}

impl ResponseMean {
    fn record(&mut self, sample_us: f64) {
        self.samples += 1;
        self.mean_us += (sample_us - self.mean_us) / self.samples as f64;
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            current_size: AtomicUsize::new(0),
            peak_size: AtomicUsize::new(0),
            response: parking_lot::Mutex::new(ResponseMean::default()),
        }
    }

    #[inline]
    pub fn record_hit(&self, response_time_us: f64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.response.lock().record(response_time_us);
    }

    #[inline]
    pub fn record_miss(&self, response_time_us: f64) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.response.lock().record(response_time_us);
    }

    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates `current_size` and bumps `peak_size` if this is a new high.
    pub fn set_current_size(&self, size: usize) {
        self.current_size.store(size, Ordering::Relaxed);
        self.peak_size.fetch_max(size, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn current_size(&self) -> usize {
        self.current_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn peak_size(&self) -> usize {
        self.peak_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn avg_response_time_us(&self) -> f64 {
        self.response.lock().mean_us
    }

    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        *self.response.lock() = ResponseMean::default();
    }

    /// A point-in-time copy for reporting (spec §6 `CacheStatusResponse`).
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            current_size: self.current_size(),
            peak_size: self.peak_size(),
            avg_response_time_us: self.avg_response_time_us(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable, serializable snapshot of one tier's [`Metrics`].
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
    pub peak_size: usize,
    pub avg_response_time_us: f64,
}

impl MetricsSnapshot {
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Aggregates per-tier snapshots into one summary using a request-count
/// weighted mean for `avg_response_time_us` (spec §9 design note: the
/// original plain average over tiers biases toward a rarely-hit tier with
/// a handful of slow requests; weighting by `total_accesses` fixes that).
pub fn aggregate(tiers: &[MetricsSnapshot]) -> MetricsSnapshot {
    let hits = tiers.iter().map(|t| t.hits).sum();
    let misses = tiers.iter().map(|t| t.misses).sum();
    let evictions = tiers.iter().map(|t| t.evictions).sum();
    let current_size = tiers.iter().map(|t| t.current_size).sum();
    let peak_size = tiers.iter().map(|t| t.peak_size).max().unwrap_or(0);

    let total_requests: u64 = tiers.iter().map(|t| t.total_accesses()).sum();
    let avg_response_time_us = if total_requests == 0 {
        0.0
    } else {
        tiers
            .iter()
            .map(|t| t.avg_response_time_us * t.total_accesses() as f64)
            .sum::<f64>()
            / total_requests as f64
    };

    MetricsSnapshot {
        hits,
        misses,
        evictions,
        current_size,
        peak_size,
        avg_response_time_us,
    }
}
