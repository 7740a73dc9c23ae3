// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use clustr_map::services::PreferenceStore;
use std::fs;

mod common;
use common::temp_store_path;

#[test]
fn test_missing_file_gives_defaults() {
    let prefs = PreferenceStore::load(temp_store_path());
    assert_eq!(prefs.map().zoom, 3.0);
    assert!(!prefs.map().has_pinned_before);
}

#[test]
fn test_written_file_round_trips() {
    let path = temp_store_path();
    let mut prefs = PreferenceStore::load(&path);
    prefs.set_zoom(5.5).unwrap();
    prefs.set_has_pinned_before(true).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!({"clustr-store": {"map": {"zoom": 5.5, "hasPinnedBefore": true}}})
    );

    let reloaded = PreferenceStore::load(&path);
    assert_eq!(reloaded.map().zoom, 5.5);
    assert!(reloaded.map().has_pinned_before);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_malformed_file_gives_defaults() {
    for content in [
        "{not json",
        r#"{"clustr-store": "oops"}"#,
        r#"{"clustr-store": {"map": {"zoom": "far"}}}"#,
    ] {
        let path = temp_store_path();
        fs::write(&path, content).unwrap();

        let prefs = PreferenceStore::load(&path);
        assert_eq!(prefs.map().zoom, 3.0, "{content}");
        assert!(!prefs.map().has_pinned_before, "{content}");
        let _ = fs::remove_file(&path);
    }
}

#[test]
fn test_out_of_range_zoom_is_bounded_on_load() {
    let path = temp_store_path();
    fs::write(&path, r#"{"clustr-store": {"map": {"zoom": 40, "hasPinnedBefore": false}}}"#).unwrap();

    assert_eq!(PreferenceStore::load(&path).map().zoom, 7.0);
    let _ = fs::remove_file(&path);
}

#[test]
fn test_unwritable_path_reports_error() {
    let dir = std::env::temp_dir().join(format!("clustr-dir-{}", uuid::Uuid::new_v4()));
    fs::create_dir(&dir).unwrap();

    // A directory can't be overwritten as a file
    let mut prefs = PreferenceStore::load(&dir);
    assert!(prefs.set_zoom(4.0).is_err());
    assert_eq!(prefs.map().zoom, 4.0);
    let _ = fs::remove_dir(&dir);
}
