use tlcache::config::FingerprintConfig;
use tlcache::fingerprint::{fingerprint, normalize};

#[test]
fn fingerprint_is_deterministic_across_calls() {
    let config = FingerprintConfig::default();
    let a = fingerprint("Hello there", "en", "fr", &config, None).unwrap();
    let b = fingerprint("Hello there", "en", "fr", &config, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn fingerprint_of_normalized_text_matches_raw_when_normalize_enabled() {
    let config = FingerprintConfig { normalize_text: true, ..FingerprintConfig::default() };
    let raw = fingerprint("  Hello   There  ", "en", "fr", &config, None).unwrap();
    let pre_normalized = fingerprint(&normalize("  Hello   There  "), "en", "fr", &config, None).unwrap();
    assert_eq!(raw, pre_normalized);
}

#[test]
fn fingerprint_differs_across_language_pairs() {
    let config = FingerprintConfig::default();
    let en_fr = fingerprint("hello", "en", "fr", &config, None).unwrap();
    let en_de = fingerprint("hello", "en", "de", &config, None).unwrap();
    assert_ne!(en_fr, en_de);
}

#[test]
fn fingerprint_rejects_invalid_language_code() {
    let config = FingerprintConfig::default();
    assert!(fingerprint("hello", "???", "fr", &config, None).is_err());
}
