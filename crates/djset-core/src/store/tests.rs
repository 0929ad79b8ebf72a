//! Tests for the fingerprint store

use super::*;
use approx::assert_relative_eq;

fn record(track_id: &str, hashes: &[&str]) -> FingerprintRecord {
    FingerprintRecord::new(
        track_id,
        format!("{} title", track_id),
        "Various",
        hashes.iter().map(|h| Fingerprint::new(*h)),
    )
}

#[test]
fn test_add_rejects_duplicate() {
    let mut store = FingerprintStore::new();
    store.add(record("track-01", &["aaaa"]), false).unwrap();

    let err = store.add(record("track-01", &["bbbb"]), false).unwrap_err();
    assert!(matches!(err, Error::DuplicateTrack(id) if id == "track-01"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_overwrite_replaces_hashes() {
    let mut store = FingerprintStore::new();
    store.add(record("track-01", &["aaaa"]), false).unwrap();
    store.add(record("track-01", &["bbbb"]), true).unwrap();

    // the old hash no longer resolves exactly
    let (found, distance) = store.find_best(&Fingerprint::new("bbbb")).unwrap();
    assert_eq!(found.track_id, "track-01");
    assert_relative_eq!(distance, 0.0);
    assert!(!store.index.contains_key(&Fingerprint::new("aaaa")));
}

#[test]
fn test_exact_hash_has_zero_distance() {
    let mut store = FingerprintStore::new();
    store.add(record("track-01", &["0000", "ffff"]), false).unwrap();
    store.add(record("track-02", &["0f0f"]), false).unwrap();

    let (found, distance) = store.find_best(&Fingerprint::new("ffff")).unwrap();
    assert_eq!(found.track_id, "track-01");
    assert_relative_eq!(distance, 0.0);
}

#[test]
fn test_nearest_hash_wins() {
    let mut store = FingerprintStore::new();
    store.add(record("track-01", &["0000"]), false).unwrap();
    store.add(record("track-02", &["00f0"]), false).unwrap();

    // one bit away from track-02, five from track-01
    let (found, distance) = store.find_best(&Fingerprint::new("00f1")).unwrap();
    assert_eq!(found.track_id, "track-02");
    assert_relative_eq!(distance, 1.0 / 16.0);
}

#[test]
fn test_ties_go_to_smallest_track_id() {
    let mut store = FingerprintStore::new();
    store.add(record("b-side", &["0001"]), false).unwrap();
    store.add(record("a-side", &["0002"]), false).unwrap();

    let (found, _) = store.find_best(&Fingerprint::new("0000")).unwrap();
    assert_eq!(found.track_id, "a-side");

    // shared exact hash: still the smallest id
    store.merge_hashes("b-side", [Fingerprint::new("0002")]).unwrap();
    let (found, distance) = store.find_best(&Fingerprint::new("0002")).unwrap();
    assert_eq!(found.track_id, "a-side");
    assert_relative_eq!(distance, 0.0);
}

#[test]
fn test_empty_store_finds_nothing() {
    let mut store = FingerprintStore::new();
    assert!(store.find_best(&Fingerprint::new("0000")).is_none());

    store.add(record("silent", &[]), false).unwrap();
    assert!(store.find_best(&Fingerprint::new("0000")).is_none());
}

#[test]
fn test_merge_and_remove() {
    let mut store = FingerprintStore::new();
    store.add(record("track-01", &["aaaa"]), false).unwrap();

    let added = store
        .merge_hashes("track-01", [Fingerprint::new("aaaa"), Fingerprint::new("cccc")])
        .unwrap();
    assert_eq!(added, 1);
    assert!(matches!(
        store.merge_hashes("missing", [Fingerprint::new("dddd")]),
        Err(Error::UnknownTrack(_))
    ));

    let removed = store.remove("track-01").unwrap();
    assert_eq!(removed.hashes.len(), 2);
    assert!(store.is_empty());
    assert!(store.index.is_empty());
    assert!(store.remove("track-01").is_none());
}

#[test]
fn test_bootstrap_defaults_and_policies() {
    let file = StoreFile::from_json_str(
        r#"{
            "track-01": {"title": "Xtal", "artist": "Aphex Twin", "hashes": ["aaaa"]},
            "track-02": {"hashes": ["bbbb"]}
        }"#,
    )
    .unwrap();

    let mut store = FingerprintStore::new();
    let report = store.bootstrap(&file, DuplicatePolicy::Reject).unwrap();
    assert_eq!(report.added, 2);

    let defaulted = store.get("track-02").unwrap();
    assert_eq!(defaulted.title, "track-02");
    assert_eq!(defaulted.artist, UNKNOWN_ARTIST);

    assert!(matches!(
        store.bootstrap(&file, DuplicatePolicy::Reject),
        Err(Error::DuplicateTrack(_))
    ));

    let report = store.bootstrap(&file, DuplicatePolicy::Skip).unwrap();
    assert_eq!(report.skipped, 2);

    let report = store.bootstrap(&file, DuplicatePolicy::Overwrite).unwrap();
    assert_eq!(report.overwritten, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_save_and_load_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FingerprintStore::new();
    store.add(record("track-02", &["bbbb"]), false).unwrap();
    store.add(record("track-01", &["aaaa", "abab"]), false).unwrap();

    for name in ["store.json", "store.djfp"] {
        let path = dir.path().join(name);
        store.save(&path).unwrap();
        let loaded = FingerprintStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("track-01"), store.get("track-01"));
    }

    let json = std::fs::read_to_string(dir.path().join("store.json")).unwrap();
    assert!(json.find("track-01").unwrap() < json.find("track-02").unwrap());
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FingerprintStore::load(&dir.path().join("absent.json")).unwrap();
    assert!(store.is_empty());
}
