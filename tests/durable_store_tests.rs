use std::fs;
use tlcache::durable::{decode_batch, encode_batch, DurableStore, CURRENT_SCHEMA_VERSION};
use tlcache::Entry;

fn entry(key: &str) -> Entry {
    Entry::new(key, "hi", "en", "fr", "bonjour", 0.9, 60_000)
}

// S7: a durable store pre-populated at an older schema version migrates to
// the current version on open, and its existing entries remain loadable.
#[test]
fn s7_schema_migrates_to_current_version_on_open() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = DurableStore::open(dir.path(), 10).unwrap();
        store.stage(entry("k1"));
        store.flush().unwrap();
    }

    // Simulate an older on-disk schema version by rewriting metadata.bin.
    let meta_path = dir.path().join("metadata.bin");
    let mut bytes = fs::read(&meta_path).unwrap();
    let older_version = CURRENT_SCHEMA_VERSION.saturating_sub(1).to_le_bytes();
    bytes[4..8].copy_from_slice(&older_version);
    fs::write(&meta_path, &bytes).unwrap();

    let reopened = DurableStore::open(dir.path(), 10).unwrap();
    assert_eq!(reopened.schema_version(), CURRENT_SCHEMA_VERSION);
    assert_eq!(reopened.load_latest().unwrap().len(), 1);
}

#[test]
fn schema_newer_than_code_is_refused() {
    let entries = vec![entry("k1")];
    let mut bytes = encode_batch(&entries);
    bytes[4..8].copy_from_slice(&(CURRENT_SCHEMA_VERSION + 1).to_le_bytes());
    assert!(decode_batch(&bytes).is_err());
}

// S8: a partial .tmp file left behind by a crash is ignored; the last
// committed batch still loads intact.
#[test]
fn s8_crash_simulation_ignores_partial_tmp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = DurableStore::open(dir.path(), 10).unwrap();
    store.stage(entry("committed"));
    store.flush().unwrap();

    // A crash mid-write leaves a `.tmp` file that never got renamed.
    fs::write(dir.path().join("batch_99999999999999999999.bin.tmp"), b"partial-garbage").unwrap();

    let loaded = store.load_latest().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].key, "committed");
}

#[test]
fn flush_is_atomic_via_tmp_then_rename() {
    let dir = tempfile::tempdir().unwrap();
    let store = DurableStore::open(dir.path(), 10).unwrap();
    store.stage(entry("k1"));
    store.flush().unwrap();

    let files: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(files.iter().any(|f| f.starts_with("batch_") && f.ends_with(".bin")));
    assert!(!files.iter().any(|f| f.ends_with(".tmp")));
}

#[test]
fn backup_and_restore_roundtrip_entries() {
    let dir = tempfile::tempdir().unwrap();
    let backup_dir = tempfile::tempdir().unwrap();
    let store = DurableStore::open(dir.path(), 10).unwrap();
    store.stage(entry("k1"));
    store.flush().unwrap();
    store.backup(backup_dir.path()).unwrap();

    let restore_target = tempfile::tempdir().unwrap();
    let fresh = DurableStore::open(restore_target.path(), 10).unwrap();
    fresh.restore(backup_dir.path()).unwrap();
    assert_eq!(fresh.load_latest().unwrap().len(), 1);
}
