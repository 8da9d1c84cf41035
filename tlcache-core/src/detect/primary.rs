//! Statistical primary language detector with a three-factor confidence
//! model (spec §4.9).

use super::fallback::{count_scripts, is_mixed_script};
use super::{DetectOptions, DetectionResult, DetectionSource};
use crate::error::{CacheError, Result};

/// Base confidence by text length: stepwise thresholds at 5/10/20/50/100
/// characters (spec §4.9 step 4).
fn base_confidence(char_count: usize) -> f64 {
    match char_count {
        0..=4 => 0.60,
        5..=9 => 0.65,
        10..=19 => 0.75,
        20..=49 => 0.85,
        50..=99 => 0.90,
        _ => 0.95,
    }
}

/// Script-match confidence: `1.0` for a single dominant (matching) script,
/// `0.7` when the input mixes scripts, `0.8` otherwise (spec §4.9 step 4).
fn script_confidence(text: &str) -> f64 {
    let counts = count_scripts(text);
    if counts.total_classified == 0 {
        0.8
    } else if is_mixed_script(&counts) {
        0.7
    } else {
        1.0
    }
}

/// Penalty applied for very short input: `0.3` under 5 chars, `0.2` under
/// 10, `0` at 10 or more (spec §4.9 step 4).
fn length_penalty(char_count: usize) -> f64 {
    match char_count {
        0..=4 => 0.3,
        5..=9 => 0.2,
        _ => 0.0,
    }
}

fn dominant_language(text: &str, preferred_languages: &[String]) -> String {
    if let Some(preferred) = preferred_languages.first() {
        return preferred.clone();
    }
    let counts = count_scripts(text);
    counts
        .counts
        .iter()
        .max_by_key(|(_, n)| *n)
        .and_then(|(name, _)| super::fallback::SCRIPT_RANGES.iter().find(|r| r.name == *name))
        .map(|r| r.default_language.to_string())
        .unwrap_or_else(|| "eng".to_string())
}

/// Runs the primary statistical detector (spec §4.9).
///
/// `final = min(base * script * (1 - penalty), 0.99)`. Returns
/// `LowConfidence` if the result falls under `options.min_confidence`.
pub fn detect(text: &str, options: &DetectOptions) -> Result<DetectionResult> {
    if text.trim().is_empty() {
        return Err(CacheError::InvalidInput("empty text".into()));
    }

    let body = if options.preprocess {
        crate::fingerprint::normalize(text)
    } else {
        text.to_string()
    };

    let char_count = body.chars().count();
    let base = base_confidence(char_count);
    let script = script_confidence(&body);
    let penalty = length_penalty(char_count);
    let confidence = (base * script * (1.0 - penalty)).min(0.99);

    let min_confidence = options.min_confidence.unwrap_or(0.0);
    if confidence < min_confidence {
        return Err(CacheError::LowConfidence(confidence));
    }

    Ok(DetectionResult {
        language: dominant_language(&body, &options.preferred_languages),
        confidence,
        source: DetectionSource::Primary,
        timestamp: crate::entry::now_ms(),
    })
}
