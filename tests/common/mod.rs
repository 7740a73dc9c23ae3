// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use clustr_map::config::Config;
use clustr_map::db::{FirestoreDb, MemoryStore};
use clustr_map::events::EventBus;
use clustr_map::services::PreferenceStore;
use clustr_map::ui::{Dialog, ModalProps};
use clustr_map::MapSession;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Dialog that records what it was asked and answers from a script.
///
/// Unscripted alerts are acknowledged and unscripted confirmations declined.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct ScriptedDialog {
    shown: Arc<Mutex<Vec<ModalProps>>>,
    answers: Arc<Mutex<VecDeque<bool>>>,
}

#[allow(dead_code)]
impl ScriptedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for the next dialogs.
    pub fn answering(answers: &[bool]) -> Self {
        let dialog = Self::default();
        dialog.answers.lock().unwrap().extend(answers);
        dialog
    }

    pub fn shown(&self) -> Vec<ModalProps> {
        self.shown.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.shown().into_iter().map(|p| p.title).collect()
    }
}

impl Dialog for ScriptedDialog {
    async fn show(&self, props: ModalProps) -> bool {
        let is_confirm = props.is_confirm;
        self.shown.lock().unwrap().push(props);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(!is_confirm)
    }
}

/// Fresh preference file path that doesn't exist yet.
#[allow(dead_code)]
pub fn temp_store_path() -> PathBuf {
    std::env::temp_dir().join(format!("clustr-store-{}.json", uuid::Uuid::new_v4()))
}

/// Seed a user document with a completed profile.
#[allow(dead_code)]
pub fn seed_user(store: &MemoryStore, id: &str, program: &str, friends: &[&str]) {
    store.insert_raw(
        "users",
        id,
        json!({
            "userName": format!("User {}", id),
            "pfp": "default-avatar.svg",
            "program": [program, "Burnaby"],
            "location": [0.5, 0.5],
            "friends": friends,
            "hasInitProfile": true,
        }),
    );
}

/// Seed a meetup document.
#[allow(dead_code)]
pub fn seed_meetup(store: &MemoryStore, id: &str, attendees: &[&str], max_attendees: i64) {
    store.insert_raw(
        "meetups",
        id,
        json!({
            "title": format!("Meetup {}", id),
            "location": "Library",
            "pin": [0.25, 0.75],
            "start": "2099-01-01T12:00",
            "end": "",
            "details": "",
            "maxAttendees": max_attendees,
            "members": attendees.len(),
            "attendees": attendees,
            "owner": "User a",
        }),
    );
}

/// Array field of a raw document as strings.
#[allow(dead_code)]
pub fn string_array(doc: &Value, field: &str) -> Vec<String> {
    doc[field]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Session over an in-memory store with in-memory preferences.
#[allow(dead_code)]
pub fn test_session(
    store: &MemoryStore,
    dialog: &ScriptedDialog,
) -> MapSession<MemoryStore, ScriptedDialog> {
    test_session_with(store, dialog, Config::default(), PreferenceStore::in_memory())
}

#[allow(dead_code)]
pub fn test_session_with(
    store: &MemoryStore,
    dialog: &ScriptedDialog,
    config: Config,
    prefs: PreferenceStore,
) -> MapSession<MemoryStore, ScriptedDialog> {
    MapSession::new(config, store.clone(), EventBus::new(), dialog.clone(), prefs)
}
