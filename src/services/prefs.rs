// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local preference store.
//!
//! Preferences live in a JSON file under the fixed `clustr-store` key. They
//! are read once at startup; unreadable or malformed content is replaced by
//! defaults without surfacing an error.

use crate::map::transform;
use crate::models::{LocalStore, MapPrefs};
use std::fs;
use std::path::{Path, PathBuf};

/// Key of the preference blob inside the file.
pub const STORAGE_KEY: &str = "clustr-store";

/// File-backed (or purely in-memory) preference store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    store: LocalStore,
}

impl PreferenceStore {
    /// Load from `path`, falling back to defaults on any read/parse failure.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let store = match fs::read_to_string(&path) {
            Ok(raw) => parse_store(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse local storage!");
                LocalStore::default()
            }),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No local storage, using defaults");
                LocalStore::default()
            }
        };

        Self {
            path: Some(path),
            store: sanitize(store),
        }
    }

    /// Preferences that are never written anywhere.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: LocalStore::default(),
        }
    }

    pub fn map(&self) -> &MapPrefs {
        &self.store.map
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), PreferenceError> {
        self.store.map.zoom = transform::bound_zoom(zoom);
        self.save()
    }

    pub fn set_has_pinned_before(&mut self, value: bool) -> Result<(), PreferenceError> {
        self.store.map.has_pinned_before = value;
        self.save()
    }

    fn save(&self) -> Result<(), PreferenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut root = serde_json::Map::new();
        root.insert(
            STORAGE_KEY.to_string(),
            serde_json::to_value(&self.store).map_err(|e| PreferenceError::Encode(e.to_string()))?,
        );
        let raw = serde_json::to_string_pretty(&root)
            .map_err(|e| PreferenceError::Encode(e.to_string()))?;

        fs::write(path, raw).map_err(|e| PreferenceError::Io(e.to_string()))?;
        tracing::debug!(path = %path.display(), "Local storage updated");
        Ok(())
    }
}

fn parse_store(raw: &str) -> Result<LocalStore, serde_json::Error> {
    let mut root: serde_json::Value = serde_json::from_str(raw)?;
    let blob = root
        .get_mut(STORAGE_KEY)
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null);
    serde_json::from_value(blob)
}

fn sanitize(mut store: LocalStore) -> LocalStore {
    store.map.zoom = transform::bound_zoom(store.map.zoom);
    store
}

/// Errors writing preferences. Reads never fail.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Failed to write local storage: {0}")]
    Io(String),

    #[error("Failed to encode local storage: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store() {
        let store =
            parse_store(r#"{"clustr-store":{"map":{"zoom":4.5,"hasPinnedBefore":true}}}"#).unwrap();
        assert_eq!(store.map.zoom, 4.5);
        assert!(store.map.has_pinned_before);
    }

    #[test]
    fn test_parse_store_rejects_wrong_shape() {
        assert!(parse_store(r#"{"clustr-store":{"map":{"zoom":"big"}}}"#).is_err());
        assert!(parse_store(r#"{"other":{}}"#).is_err());
        assert!(parse_store("not json").is_err());
    }

    #[test]
    fn test_in_memory_defaults() {
        let mut prefs = PreferenceStore::in_memory();
        assert_eq!(prefs.map().zoom, 3.0);
        assert!(!prefs.map().has_pinned_before);
        prefs.set_zoom(20.0).unwrap();
        assert_eq!(prefs.map().zoom, 7.0);
    }
}
