//! Script/range-based classifier, the LDE's fallback detector (spec §4.10).
//!
//! Counts characters per Unicode script range and returns the
//! highest-count script's default language. Used standalone as a fallback
//! path and as the "matching script" signal the primary detector's
//! confidence model (spec §4.9) folds in.

use super::{DetectOptions, DetectionResult, DetectionSource};
use crate::error::{CacheError, Result};

/// One entry in the script-range table (spec §4.10).
#[derive(Debug, Clone, Copy)]
pub struct ScriptRange {
    pub name: &'static str,
    pub start: u32,
    pub end: u32,
    pub default_language: &'static str,
}

pub const SCRIPT_RANGES: &[ScriptRange] = &[
    ScriptRange { name: "Latin", start: 0x0041, end: 0x007A, default_language: "eng" },
    ScriptRange { name: "Cyrillic", start: 0x0400, end: 0x04FF, default_language: "rus" },
    ScriptRange { name: "Hiragana/Katakana", start: 0x3040, end: 0x30FF, default_language: "jpn" },
    ScriptRange { name: "Hangul", start: 0xAC00, end: 0xD7AF, default_language: "kor" },
    ScriptRange { name: "CJK Unified", start: 0x4E00, end: 0x9FFF, default_language: "cmn" },
    ScriptRange { name: "Arabic", start: 0x0600, end: 0x06FF, default_language: "ara" },
    ScriptRange { name: "Devanagari", start: 0x0900, end: 0x097F, default_language: "hin" },
    ScriptRange { name: "Thai", start: 0x0E00, end: 0x0E7F, default_language: "tha" },
];

/// Classifies one character into a script range, if any (spec §4.10 table).
pub fn classify_char(c: char) -> Option<&'static ScriptRange> {
    let code = c as u32;
    SCRIPT_RANGES.iter().find(|r| code >= r.start && code <= r.end)
}

/// Per-script character tally for one input string.
#[derive(Debug, Default)]
pub struct ScriptCounts {
    pub counts: Vec<(&'static str, usize)>,
    pub total_classified: usize,
    pub total_chars: usize,
}

pub fn count_scripts(text: &str) -> ScriptCounts {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    let mut total_classified = 0usize;
    let mut total_chars = 0usize;
    for c in text.chars() {
        total_chars += 1;
        if let Some(range) = classify_char(c) {
            total_classified += 1;
            match counts.iter_mut().find(|(name, _)| *name == range.name) {
                Some((_, n)) => *n += 1,
                None => counts.push((range.name, 1)),
            }
        }
    }
    ScriptCounts { counts, total_classified, total_chars }
}

/// `true` when `counts` shows characters from more than one classified
/// script (spec §4.9's "mixed-script" confidence case).
pub fn is_mixed_script(counts: &ScriptCounts) -> bool {
    counts.counts.iter().filter(|(_, n)| *n > 0).count() > 1
}

/// Length factor for the fallback's confidence formula (spec §4.10): grows
/// with text length up to `0.95` for pure scripts, capped at `0.80` when
/// mixed.
fn length_factor(char_count: usize, mixed: bool) -> f64 {
    let grown: f64 = match char_count {
        0..=4 => 0.5,
        5..=9 => 0.65,
        10..=19 => 0.8,
        20..=49 => 0.9,
        _ => 0.95,
    };
    if mixed {
        grown.min(0.80)
    } else {
        grown
    }
}

/// Classifies `text` by dominant Unicode script (spec §4.10). Digit- or
/// punctuation-only text (nothing classifiable) returns `eng` at
/// confidence `<= 0.5`.
pub fn detect(text: &str, _options: &DetectOptions) -> Result<DetectionResult> {
    if text.is_empty() {
        return Err(CacheError::InvalidInput("empty text".into()));
    }

    let counts = count_scripts(text);
    if counts.total_classified == 0 {
        return Ok(DetectionResult {
            language: "eng".to_string(),
            confidence: 0.5,
            source: DetectionSource::Fallback,
            timestamp: crate::entry::now_ms(),
        });
    }

    let dominant = counts
        .counts
        .iter()
        .max_by_key(|(_, n)| *n)
        .expect("total_classified > 0 implies a dominant entry");

    let mixed = is_mixed_script(&counts);
    let ratio = dominant.1 as f64 / counts.total_chars as f64;
    let confidence = (ratio * length_factor(counts.total_chars, mixed)).min(0.95);

    let language = SCRIPT_RANGES
        .iter()
        .find(|r| r.name == dominant.0)
        .map(|r| r.default_language)
        .unwrap_or("eng");

    Ok(DetectionResult {
        language: language.to_string(),
        confidence,
        source: DetectionSource::Fallback,
        timestamp: crate::entry::now_ms(),
    })
}
