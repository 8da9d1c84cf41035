//! Typed request/response contracts for the HTTP/JSON API the hosting
//! translation service exposes over this crate (spec §6). This module
//! defines the wire types only; routing and HTTP framing belong to the
//! enclosing service, which the spec scopes out of this crate (spec §1
//! Non-goals: "transport layers").

use crate::detect::DetectionSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateTextRequest {
    pub text: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    pub target_lang: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateTextResponse {
    pub translated_text: String,
    pub detected_language: String,
    pub confidence: f64,
    pub cached: bool,
    pub model_used: Option<String>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateBatchRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub source_lang: Option<String>,
    pub target_lang: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateBatchResponse {
    pub results: Vec<TranslateTextResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectLanguageRequest {
    pub text: String,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageAlternative {
    pub language: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectLanguageResponse {
    pub detected_language: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<LanguageAlternative>>,
}

impl DetectLanguageResponse {
    pub fn from_result(result: &crate::detect::DetectionResult, alternatives: Vec<LanguageAlternative>) -> Self {
        Self {
            detected_language: result.language.clone(),
            confidence: result.confidence,
            alternatives: if alternatives.is_empty() { None } else { Some(alternatives) },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportedLanguage {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupportedLanguagesResponse {
    pub languages: Vec<SupportedLanguage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CachePreloadRequest {
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub size_limit_kb: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachePreloadResponse {
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerPairStats {
    pub source_lang: String,
    pub target_lang: String,
    pub count: usize,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusResponse {
    pub size_kb: u64,
    pub count: usize,
    pub hit_rate: f64,
    pub per_pair: Vec<PerPairStats>,
}

impl CacheStatusResponse {
    pub fn from_metrics(snapshot: &crate::metrics::MetricsSnapshot, size_kb: u64, per_pair: Vec<PerPairStats>) -> Self {
        Self {
            size_kb,
            count: snapshot.current_size,
            hit_rate: snapshot.hit_rate(),
            per_pair,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheDeleteQuery {
    pub scope: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

impl From<DetectionSource> for &'static str {
    fn from(source: DetectionSource) -> Self {
        match source {
            DetectionSource::Primary => "primary",
            DetectionSource::Fallback => "fallback",
            DetectionSource::CacheExact => "cache-exact",
            DetectionSource::CachePattern => "cache-pattern",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_text_request_deserializes_with_optional_fields_absent() {
        let json = r#"{"text": "hi", "target_lang": "fr"}"#;
        let req: TranslateTextRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.target_lang, "fr");
        assert!(req.source_lang.is_none());
    }

    #[test]
    fn detect_language_response_omits_alternatives_when_empty() {
        let resp = DetectLanguageResponse {
            detected_language: "eng".to_string(),
            confidence: 0.9,
            alternatives: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("alternatives"));
    }

    #[test]
    fn cache_status_response_derives_hit_rate_from_snapshot() {
        let snapshot = crate::metrics::MetricsSnapshot {
            hits: 9,
            misses: 1,
            evictions: 0,
            current_size: 5,
            peak_size: 5,
            avg_response_time_us: 1.0,
        };
        let resp = CacheStatusResponse::from_metrics(&snapshot, 10, vec![]);
        assert!((resp.hit_rate - 0.9).abs() < 1e-9);
        assert_eq!(resp.count, 5);
    }

    #[test]
    fn detection_source_maps_to_wire_strings() {
        let s: &'static str = DetectionSource::CachePattern.into();
        assert_eq!(s, "cache-pattern");
    }
}
