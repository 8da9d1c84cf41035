//! Two-level detection cache: an exact-match L1 ring with
//! frequency-weighted LRU eviction, and an L2 pattern cache keyed by
//! per-language feature vectors (spec §4.11).

use super::{DetectionResult, DetectionSource};
use crate::config::DetectionConfig;
use crate::fingerprint::normalize;
use parking_lot::RwLock;
use std::collections::HashMap;

/// One entry in the exact-match cache: mirrors a translation entry's
/// access bookkeeping (spec §3 `DetectionCacheEntry`).
#[derive(Debug, Clone)]
pub struct DetectionCacheEntry {
    pub text_hash: u64,
    pub result: DetectionResult,
    pub last_access: u64,
    pub access_count: u64,
}

/// Per-language n-gram/character-class feature vector used for L2 pattern
/// matching (spec §3 `PatternProfile`).
#[derive(Debug, Clone, Default)]
pub struct PatternProfile {
    pub language: String,
    pub bigram_freq: HashMap<String, f64>,
}

fn bigram_vector(text: &str) -> HashMap<String, f64> {
    let chars: Vec<char> = text.chars().collect();
    let mut freq: HashMap<String, f64> = HashMap::new();
    if chars.len() < 2 {
        return freq;
    }
    for window in chars.windows(2) {
        let bigram: String = window.iter().collect();
        *freq.entry(bigram).or_insert(0.0) += 1.0;
    }
    let total: f64 = freq.values().sum();
    if total > 0.0 {
        for v in freq.values_mut() {
            *v /= total;
        }
    }
    freq
}

/// Cosine similarity between two sparse bigram-frequency vectors.
fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let mut dot = 0.0;
    for (key, av) in a {
        if let Some(bv) = b.get(key) {
            dot += av * bv;
        }
    }
    let norm_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl PatternProfile {
    pub fn from_samples(language: impl Into<String>, samples: &[&str]) -> Self {
        let mut bigram_freq: HashMap<String, f64> = HashMap::new();
        for sample in samples {
            for (k, v) in bigram_vector(&normalize(sample)) {
                *bigram_freq.entry(k).or_insert(0.0) += v;
            }
        }
        let total: f64 = bigram_freq.values().sum();
        if total > 0.0 {
            for v in bigram_freq.values_mut() {
                *v /= total;
            }
        }
        Self { language: language.into(), bigram_freq }
    }
}

struct Inner {
    exact: HashMap<u64, DetectionCacheEntry>,
    patterns: Vec<PatternProfile>,
}

/// The two-level detection cache: an exact-match ring (`l1_capacity`
/// entries, frequency-weighted LRU eviction) in front of a pattern cache
/// compared by cosine similarity over bigram feature vectors.
pub struct DetectionCache {
    config: DetectionConfig,
    inner: RwLock<Inner>,
}

impl DetectionCache {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner { exact: HashMap::new(), patterns: Vec::new() }),
        }
    }

    pub fn register_pattern(&self, profile: PatternProfile) {
        self.inner.write().patterns.push(profile);
    }

    /// The exact-cache entry lifetime configured for this cache
    /// (`DetectionConfig::cache_ttl_ms`), as `lookup_exact` expects.
    pub fn ttl_ms(&self) -> u64 {
        self.config.cache_ttl_ms
    }

    fn hash_text(text: &str) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    /// Looks up `text` in the exact cache. Expired results (older than
    /// `ttl_ms`) are purged on access rather than returned.
    pub fn lookup_exact(&self, text: &str, now: u64, ttl_ms: u64) -> Option<DetectionResult> {
        let hash = Self::hash_text(text);
        let mut inner = self.inner.write();
        match inner.exact.get_mut(&hash) {
            Some(entry) if now.saturating_sub(entry.result.timestamp) <= ttl_ms => {
                entry.last_access = now;
                entry.access_count += 1;
                let mut result = entry.result.clone();
                result.source = DetectionSource::CacheExact;
                Some(result)
            }
            Some(_) => {
                inner.exact.remove(&hash);
                None
            }
            None => None,
        }
    }

    /// Inserts `result` into the exact cache for `text`, evicting the
    /// lowest-`adjusted_time` entry first if at capacity (spec §4.11:
    /// `adjusted_time = last_access + access_count * frequency_weight`).
    pub fn insert_exact(&self, text: &str, result: DetectionResult, now: u64) {
        let hash = Self::hash_text(text);
        let mut inner = self.inner.write();
        if inner.exact.len() >= self.config.l1_capacity && !inner.exact.contains_key(&hash) {
            if let Some(victim) = Self::pick_eviction_victim(&inner.exact, self.config.frequency_weight) {
                inner.exact.remove(&victim);
            }
        }
        inner.exact.insert(
            hash,
            DetectionCacheEntry { text_hash: hash, result, last_access: now, access_count: 1 },
        );
    }

    fn pick_eviction_victim(exact: &HashMap<u64, DetectionCacheEntry>, weight: f64) -> Option<u64> {
        exact
            .iter()
            .map(|(hash, entry)| {
                let adjusted = entry.last_access as f64 + entry.access_count as f64 * weight;
                (*hash, adjusted)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(hash, _)| hash)
    }

    /// L2 pattern lookup (spec §4.11): compares `text`'s bigram vector
    /// against every registered profile, returning the best match if it
    /// clears `pattern_match_threshold` and the input clears
    /// `min_text_length_for_pattern_match`. Confidence is the similarity,
    /// capped at `0.8`.
    pub fn lookup_pattern(&self, text: &str) -> Option<DetectionResult> {
        if text.chars().count() < self.config.min_text_length_for_pattern_match {
            return None;
        }
        let vector = bigram_vector(&normalize(text));
        let inner = self.inner.read();
        let best = inner
            .patterns
            .iter()
            .map(|p| (p, cosine_similarity(&vector, &p.bigram_freq)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        if best.1 < self.config.pattern_match_threshold {
            return None;
        }

        Some(DetectionResult {
            language: best.0.language.clone(),
            confidence: best.1.min(0.8),
            source: DetectionSource::CachePattern,
            timestamp: crate::entry::now_ms(),
        })
    }

    /// Whether `result` clears the bar to be cached at all
    /// (`min_confidence_for_cache`).
    pub fn should_cache(&self, result: &DetectionResult) -> bool {
        result.confidence >= self.config.min_confidence_for_cache
    }

    pub fn exact_len(&self) -> usize {
        self.inner.read().exact.len()
    }
}
