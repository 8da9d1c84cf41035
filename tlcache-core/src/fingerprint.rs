//! Deterministic request fingerprinting (spec §4.1).
//!
//! A fingerprint is a short, stable string key derived from
//! `(source_text, source_lang, target_lang)`. Two requests that normalize
//! to the same text and share both language codes always produce the same
//! key; requests that merely hash-collide but differ in source text after
//! normalization are still distinguished by the entry store at lookup time
//! (`entry_store.rs` compares `source_text` on a hash match).

use crate::config::FingerprintConfig;
use crate::error::{CacheError, Result};

/// Selects which non-cryptographic hash backs a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HashAlgorithm {
    /// 32-bit FNV-1a, rendered as 8 hex digits.
    Fnv1a32,
    /// 128-bit FNV-1a, rendered as 32 hex digits, for extra collision resistance.
    Fnv1a128,
}

const FNV_OFFSET_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 0x0100_0193;
const FNV_OFFSET_128: u128 = 0x6c62_2720_6474_696d_6520_6861_7368_0000;
const FNV_PRIME_128: u128 = (1u128 << 88) + 0x13b;

fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_32;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME_32);
    }
    hash
}

fn fnv1a_128(data: &[u8]) -> u128 {
    let mut hash = FNV_OFFSET_128;
    for &byte in data {
        hash ^= byte as u128;
        hash = hash.wrapping_mul(FNV_PRIME_128);
    }
    hash
}

/// Maximum key length in bytes (spec §4.1).
pub const MAX_KEY_BYTES: usize = 512;

/// Normalizes text for fingerprint hashing: strip leading/trailing
/// whitespace, collapse internal whitespace runs to a single space, and
/// lower-case under Unicode simple lowercase mapping.
///
/// ```
/// use tlcache_core::fingerprint::normalize;
/// assert_eq!(normalize("  Hello   World  "), "hello world");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true; // treat leading whitespace as already-seen
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Validates a language code against `^[a-z]{2,3}(-[A-Z][a-z]{3})?(-[A-Z]{2})?$`
/// without pulling in the `regex` crate, since the grammar is small and fixed.
///
/// ```
/// use tlcache_core::fingerprint::validate_lang_code;
/// assert!(validate_lang_code("en").is_ok());
/// assert!(validate_lang_code("zh-Hans-CN").is_ok());
/// assert!(validate_lang_code("en:fr").is_err());
/// ```
pub fn validate_lang_code(code: &str) -> Result<()> {
    let bytes = code.as_bytes();
    let mut i = 0usize;

    let lang_start = i;
    while i < bytes.len() && bytes[i].is_ascii_lowercase() {
        i += 1;
    }
    let lang_len = i - lang_start;
    if !(2..=3).contains(&lang_len) {
        return Err(invalid(code));
    }

    if bytes.get(i) == Some(&b'-') {
        // Try script subtag: '-' Upper lower{3}
        let save = i;
        i += 1;
        let script_start = i;
        if bytes.get(i).map(u8::is_ascii_uppercase) == Some(true) {
            i += 1;
            let mut lowers = 0;
            while lowers < 3 && bytes.get(i).map(u8::is_ascii_lowercase) == Some(true) {
                i += 1;
                lowers += 1;
            }
            if i - script_start != 4 {
                i = save; // not a valid script subtag, rewind
            }
        } else {
            i = save;
        }
    }

    if bytes.get(i) == Some(&b'-') {
        let save = i;
        i += 1;
        let region_start = i;
        while bytes.get(i).map(u8::is_ascii_uppercase) == Some(true) {
            i += 1;
        }
        if i - region_start != 2 {
            i = save;
        }
    }

    if i != bytes.len() {
        return Err(invalid(code));
    }
    Ok(())
}

fn invalid(code: &str) -> CacheError {
    CacheError::InvalidInput(format!("invalid language code: {code:?}"))
}

/// Derives the fingerprint key string for a translation request.
///
/// Format: `<source_lang>:<target_lang>:<hex(hash)>[:<timestamp_ms>]`.
/// Normalization is applied only when `config.normalize_text` is set.
/// The key is truncated-checked against [`MAX_KEY_BYTES`]; a key that would
/// exceed the bound is an error rather than silently truncated, since
/// truncation could collide unrelated requests.
pub fn fingerprint(
    source_text: &str,
    source_lang: &str,
    target_lang: &str,
    config: &FingerprintConfig,
    timestamp_ms: Option<u64>,
) -> Result<String> {
    validate_lang_code(source_lang)?;
    validate_lang_code(target_lang)?;

    let body = if config.normalize_text {
        normalize(source_text)
    } else {
        source_text.to_string()
    };

    let hash_hex = if config.use_wide_hash {
        format!("{:032x}", fnv1a_128(body.as_bytes()))
    } else {
        format!("{:08x}", fnv1a_32(body.as_bytes()))
    };

    let mut key = format!("{source_lang}:{target_lang}:{hash_hex}");
    if config.include_timestamp_suffix {
        if let Some(ts) = timestamp_ms {
            key.push(':');
            key.push_str(&ts.to_string());
        }
    }

    if key.len() > MAX_KEY_BYTES {
        return Err(CacheError::InvalidInput(format!(
            "fingerprint key exceeds {MAX_KEY_BYTES} bytes"
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_lowercases() {
        assert_eq!(normalize("  Hello   World  "), "hello world");
        assert_eq!(normalize("ALL CAPS"), "all caps");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let cfg = FingerprintConfig::default();
        let a = fingerprint("Hello", "en", "fr", &cfg, None).unwrap();
        let b = fingerprint("Hello", "en", "fr", &cfg, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_ignores_case_and_spacing_when_normalized() {
        let cfg = FingerprintConfig {
            normalize_text: true,
            ..Default::default()
        };
        let a = fingerprint("hello world", "en", "fr", &cfg, None).unwrap();
        let b = fingerprint("  Hello   World  ", "en", "fr", &cfg, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_key_format() {
        let cfg = FingerprintConfig::default();
        let key = fingerprint("bonjour", "en", "fr", &cfg, None).unwrap();
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "en");
        assert_eq!(parts[1], "fr");
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn fingerprint_wide_hash_is_32_hex_chars() {
        let cfg = FingerprintConfig {
            use_wide_hash: true,
            ..Default::default()
        };
        let key = fingerprint("bonjour", "en", "fr", &cfg, None).unwrap();
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts[2].len(), 32);
    }

    #[test]
    fn fingerprint_timestamp_suffix_is_opt_in() {
        let mut cfg = FingerprintConfig::default();
        cfg.include_timestamp_suffix = true;
        let key = fingerprint("bonjour", "en", "fr", &cfg, Some(12345)).unwrap();
        assert!(key.ends_with(":12345"));
    }

    #[test]
    fn rejects_colon_in_lang_code() {
        let cfg = FingerprintConfig::default();
        assert!(fingerprint("hi", "en:x", "fr", &cfg, None).is_err());
    }

    #[test]
    fn validates_simple_and_extended_lang_codes() {
        assert!(validate_lang_code("en").is_ok());
        assert!(validate_lang_code("eng").is_ok());
        assert!(validate_lang_code("en-US").is_ok());
        assert!(validate_lang_code("zh-Hans-CN").is_ok());
        assert!(validate_lang_code("zh-Hans").is_ok());
        assert!(validate_lang_code("").is_err());
        assert!(validate_lang_code("ENGLISH").is_err());
        assert!(validate_lang_code("en-USA-extra").is_err());
    }

    #[test]
    fn differing_source_text_is_not_the_caller_problem_of_fingerprint_alone() {
        // Two distinct texts may hash-collide in theory; fingerprint() does
        // not guarantee distinctness by itself. The entry store is
        // responsible for comparing `source_text` on a hash match
        // (spec §4.1 "Collisions are handled at the entry-store layer").
        let cfg = FingerprintConfig::default();
        let a = fingerprint("hello", "en", "fr", &cfg, None).unwrap();
        let b = fingerprint("HELLO", "en", "fr", &cfg, None).unwrap();
        assert_eq!(a, b, "normalization makes these equal by design");
    }
}
