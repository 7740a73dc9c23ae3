//! Locally persisted map preferences.

use serde::{Deserialize, Serialize};

/// Zoom used when nothing valid has been stored.
pub const DEFAULT_ZOOM: f64 = 3.0;

/// The `clustr-store` blob: `{ "map": { "zoom": 3, "hasPinnedBefore": false } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalStore {
    pub map: MapPrefs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPrefs {
    pub zoom: f64,
    /// Suppresses the "how to update your location" hint
    pub has_pinned_before: bool,
}

impl Default for MapPrefs {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            has_pinned_before: false,
        }
    }
}
