//! Language Detection Engine: primary statistical detector, script-based
//! fallback, and a two-level detection cache (spec §4.9–§4.11).

use crate::error::{CacheError, Result};

pub mod cache;
pub mod fallback;
pub mod primary;

/// Where a [`DetectionResult`] came from, carried for observability and for
/// the detection cache's insertion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectionSource {
    Primary,
    Fallback,
    CacheExact,
    CachePattern,
}

/// Outcome of a language detection call (spec §3 `DetectionResult`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DetectionResult {
    pub language: String,
    pub confidence: f64,
    pub source: DetectionSource,
    pub timestamp: u64,
}

/// Caller-supplied knobs for one `detect` call (spec §4.9 `options`).
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub min_confidence: Option<f64>,
    pub preferred_languages: Vec<String>,
    pub preprocess: bool,
}

/// The engine entry point (spec §2): exact cache, then pattern cache, then
/// primary, falling back to the script classifier when primary reports low
/// confidence or rejects the input, feeding every freshly computed result
/// back into the exact cache.
pub fn detect_language(
    text: &str,
    options: &DetectOptions,
    cache: &cache::DetectionCache,
    now: u64,
) -> Result<DetectionResult> {
    if let Some(hit) = cache.lookup_exact(text, now, cache.ttl_ms()) {
        return Ok(hit);
    }

    if let Some(hit) = cache.lookup_pattern(text) {
        if cache.should_cache(&hit) {
            cache.insert_exact(text, hit.clone(), now);
        }
        return Ok(hit);
    }

    let result = match primary::detect(text, options) {
        Ok(result) => result,
        Err(CacheError::LowConfidence(_)) | Err(CacheError::InvalidInput(_)) => {
            fallback::detect(text, options)?
        }
        Err(e) => return Err(e),
    };

    if cache.should_cache(&result) {
        cache.insert_exact(text, result.clone(), now);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use cache::{DetectionCache, PatternProfile};

    #[test]
    fn first_call_runs_primary_and_populates_exact_cache() {
        let detection_cache = DetectionCache::new(DetectionConfig::default());
        let result = detect_language("hello there friend", &DetectOptions::default(), &detection_cache, 1000).unwrap();
        assert!(matches!(result.source, DetectionSource::Primary));
        assert_eq!(detection_cache.exact_len(), 1);
    }

    #[test]
    fn second_call_is_served_from_exact_cache() {
        let detection_cache = DetectionCache::new(DetectionConfig::default());
        detect_language("hello there friend", &DetectOptions::default(), &detection_cache, 1000).unwrap();
        let second = detect_language("hello there friend", &DetectOptions::default(), &detection_cache, 1500).unwrap();
        assert!(matches!(second.source, DetectionSource::CacheExact));
    }

    #[test]
    fn pattern_cache_is_consulted_before_primary() {
        let detection_cache = DetectionCache::new(DetectionConfig::default());
        detection_cache.register_pattern(PatternProfile::from_samples(
            "eng",
            &["hello world", "good morning", "thank you very much"],
        ));
        let result = detect_language("hello there friend", &DetectOptions::default(), &detection_cache, 1000).unwrap();
        assert!(matches!(result.source, DetectionSource::CachePattern));
    }

    #[test]
    fn low_confidence_primary_result_falls_back_to_script_classifier() {
        let detection_cache = DetectionCache::new(DetectionConfig::default());
        let options = DetectOptions { min_confidence: Some(0.99), ..DetectOptions::default() };
        let result = detect_language("hi", &options, &detection_cache, 1000).unwrap();
        assert!(matches!(result.source, DetectionSource::Fallback));
    }

    #[test]
    fn empty_input_propagates_invalid_input_error() {
        let detection_cache = DetectionCache::new(DetectionConfig::default());
        let err = detect_language("", &DetectOptions::default(), &detection_cache, 1000).unwrap_err();
        assert!(matches!(err, CacheError::InvalidInput(_)));
    }
}
