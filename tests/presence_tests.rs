// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use clustr_map::db::{AtomicUpdate, DocumentStore, MemoryStore};
use clustr_map::error::AppError;
use clustr_map::events::{AppEvent, EventKind};
use clustr_map::map::pin::{PinImage, PinKind, PLACEHOLDER_AVATAR};
use clustr_map::services::PresenceSync;
use clustr_map::ui::ProfileIcon;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{seed_meetup, seed_user, test_session, ScriptedDialog};

fn peer_ids(session: &clustr_map::MapSession<MemoryStore, ScriptedDialog>) -> Vec<String> {
    let mut ids: Vec<String> = session.with_pins(|layer| {
        layer
            .iter()
            .filter_map(|(_, pin)| match &pin.kind {
                PinKind::Peer(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    });
    ids.sort();
    ids
}

fn meetup_ids(session: &clustr_map::MapSession<MemoryStore, ScriptedDialog>) -> Vec<String> {
    session.with_pins(|layer| {
        layer
            .iter()
            .filter_map(|(_, pin)| match &pin.kind {
                PinKind::Meetup(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    })
}

#[tokio::test]
async fn test_visibility_scenario() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    seed_user(&store, "b", "CST", &[]);
    seed_user(&store, "c", "Other...", &[]);
    seed_user(&store, "d", "BUSN", &[]);

    let session = test_session(&store, &ScriptedDialog::new());
    session.handle_auth_change(Some("a".to_string())).await;
    assert_eq!(peer_ids(&session), vec!["b", "c"]);

    // One-sided friendship is not enough
    seed_user(&store, "a", "CST", &["d"]);
    session.sync_presence().await;
    assert_eq!(peer_ids(&session), vec!["b", "c"]);

    seed_user(&store, "d", "BUSN", &["a"]);
    session.sync_presence().await;
    assert_eq!(peer_ids(&session), vec!["b", "c", "d"]);
}

#[tokio::test]
async fn test_uninitialized_profiles_are_hidden() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    store.insert_raw(
        "users",
        "fresh",
        json!({"userName": "New", "program": ["CST", "Burnaby"], "location": [0, 0], "hasInitProfile": false}),
    );

    let session = test_session(&store, &ScriptedDialog::new());
    session.handle_auth_change(Some("a".to_string())).await;
    assert!(peer_ids(&session).is_empty());
}

#[tokio::test]
async fn test_self_pin_and_profile_icon_follow_own_document() {
    let store = MemoryStore::new();
    store.insert_raw(
        "users",
        "a",
        json!({
            "userName": "Ana",
            "pfp": "iVBORw0KGgo=",
            "program": ["CST", "Burnaby"],
            "location": [0.1, 0.2],
            "hasInitProfile": true,
        }),
    );

    let session = test_session(&store, &ScriptedDialog::new());
    let icon = ProfileIcon::attach(session.bus());
    assert!(!session.self_pin().unwrap().visible);

    session.handle_auth_change(Some("a".to_string())).await;

    let me = session.self_pin().unwrap();
    assert!(me.visible);
    assert_eq!(me.normalized, Some((0.1, 0.2)));
    assert_eq!(
        me.image,
        PinImage::Avatar("data:image/png;base64,iVBORw0KGgo=".to_string())
    );
    assert_eq!(icon.render().src, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn test_bad_avatar_falls_back_to_placeholder() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    store.insert_raw(
        "users",
        "b",
        json!({"userName": "Bo", "pfp": "%%%not-base64%%%", "program": ["CST", "Burnaby"], "hasInitProfile": true}),
    );

    let session = test_session(&store, &ScriptedDialog::new());
    session.handle_auth_change(Some("a".to_string())).await;

    let images: Vec<PinImage> = session.with_pins(|layer| {
        layer
            .iter()
            .filter(|(_, pin)| pin.kind == PinKind::Peer("b".to_string()))
            .map(|(_, pin)| pin.image.clone())
            .collect()
    });
    assert_eq!(images, vec![PinImage::Avatar(PLACEHOLDER_AVATAR.to_string())]);
}

#[tokio::test]
async fn test_meetups_without_start_or_pin_are_skipped() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    seed_meetup(&store, "shown", &["a"], -1);
    store.insert_raw("meetups", "no-start", json!({"title": "Draft", "start": "", "pin": [0.5, 0.5], "attendees": ["a"], "members": 1}));
    store.insert_raw("meetups", "no-pin", json!({"title": "Online", "start": "2099-01-01T10:00", "attendees": ["a"], "members": 1}));

    let session = test_session(&store, &ScriptedDialog::new());
    session.handle_auth_change(Some("a".to_string())).await;

    assert_eq!(meetup_ids(&session), vec!["shown"]);
}

#[tokio::test]
async fn test_fetch_failures_degrade_independently() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    seed_user(&store, "b", "CST", &[]);
    seed_meetup(&store, "m1", &["b"], -1);
    // Undecodable peer is dropped on its own
    store.insert_raw("users", "broken", json!({"program": 42, "hasInitProfile": true}));

    let session = test_session(&store, &ScriptedDialog::new());

    store.fail_collection("meetups");
    session.handle_auth_change(Some("a".to_string())).await;
    assert_eq!(peer_ids(&session), vec!["b"]);
    assert!(meetup_ids(&session).is_empty());

    store.restore("meetups");
    store.fail_collection("users");
    session.sync_presence().await;
    assert!(peer_ids(&session).is_empty());
    assert_eq!(meetup_ids(&session), vec!["m1"]);
}

#[tokio::test]
async fn test_missing_self_document_sees_other_program_users() {
    let store = MemoryStore::new();
    seed_user(&store, "b", "CST", &[]);
    seed_user(&store, "c", "Other...", &[]);

    let session = test_session(&store, &ScriptedDialog::new());
    session.handle_auth_change(Some("ghost".to_string())).await;

    assert_eq!(peer_ids(&session), vec!["c"]);
    assert!(!session.self_pin().unwrap().visible);
}

#[tokio::test]
async fn test_sign_out_clears_map() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    seed_user(&store, "b", "CST", &[]);

    let session = test_session(&store, &ScriptedDialog::new());
    let auth = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&auth);
    session.bus().on(EventKind::AuthStateChange, move |event| {
        if let AppEvent::AuthStateChange(uid) = event {
            sink.lock().unwrap().push(uid.clone());
        }
    });

    session.handle_auth_change(Some("a".to_string())).await;
    session.handle_auth_change(None).await;

    assert!(peer_ids(&session).is_empty());
    assert!(!session.self_pin().unwrap().visible);
    assert!(!session.sync_presence().await);
    assert_eq!(*auth.lock().unwrap(), vec![Some("a".to_string()), None]);
}

/// Store whose next `users` listing is answered late, with the data as it
/// was when the request was made.
#[derive(Clone)]
struct SlowStore {
    inner: MemoryStore,
    delay_next_users: Arc<Mutex<Option<Duration>>>,
}

impl DocumentStore for SlowStore {
    async fn get_document<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.get_document(collection, id).await
    }

    async fn list_documents<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let result = self.inner.list_documents(collection).await;
        let delay = if collection == "users" {
            self.delay_next_users.lock().unwrap().take()
        } else {
            None
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn query_eq<T>(&self, collection: &str, filters: &[(&str, &str)]) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.query_eq(collection, filters).await
    }

    async fn set_document<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        self.inner.set_document(collection, id, doc).await
    }

    async fn add_document<T>(&self, collection: &str, doc: &T) -> Result<String, AppError>
    where
        T: Serialize + Sync,
    {
        self.inner.add_document(collection, doc).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), AppError> {
        self.inner.update_fields(collection, id, patch).await
    }

    async fn update_atomic<F, R>(&self, collection: &str, id: &str, apply: F) -> Result<R, AppError>
    where
        F: Fn(Option<serde_json::Value>) -> Result<AtomicUpdate<R>, AppError> + Send + Sync + 'static,
        R: Send + 'static,
    {
        self.inner.update_atomic(collection, id, apply).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.inner.delete_document(collection, id).await
    }

    async fn array_union(&self, collection: &str, id: &str, field: &str, values: &[String]) -> Result<(), AppError> {
        self.inner.array_union(collection, id, field, values).await
    }

    async fn array_remove(&self, collection: &str, id: &str, field: &str, values: &[String]) -> Result<(), AppError> {
        self.inner.array_remove(collection, id, field, values).await
    }
}

#[tokio::test]
async fn test_stale_sync_does_not_overwrite_newer_one() {
    let memory = MemoryStore::new();
    seed_user(&memory, "a", "CST", &[]);
    seed_user(&memory, "b", "CST", &[]);

    let store = SlowStore {
        inner: memory.clone(),
        delay_next_users: Arc::new(Mutex::new(Some(Duration::from_millis(200)))),
    };
    let session = clustr_map::MapSession::new(
        clustr_map::config::Config::default(),
        store,
        clustr_map::events::EventBus::new(),
        ScriptedDialog::new(),
        clustr_map::services::PreferenceStore::in_memory(),
    );

    let first = session.handle_auth_change(Some("a".to_string()));
    let second = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        seed_user(&memory, "e", "CST", &[]);
        session.sync_presence().await
    };
    let ((), second_applied) = tokio::join!(first, second);

    assert!(second_applied);
    let mut peers: Vec<String> = session.with_pins(|layer| {
        layer
            .iter()
            .filter_map(|(_, pin)| match &pin.kind {
                PinKind::Peer(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    });
    peers.sort();
    assert_eq!(peers, vec!["b", "e"]);
}

#[tokio::test]
async fn test_presence_sync_load_is_pure() {
    let store = MemoryStore::new();
    seed_user(&store, "a", "CST", &[]);
    seed_user(&store, "b", "CST", &[]);

    let sync = PresenceSync::new(store.clone());
    let snapshot = sync.load("a").await;

    assert_eq!(snapshot.peers.len(), 1);
    assert_eq!(snapshot.peers[0].name, "User b");
    assert_eq!(snapshot.peers[0].avatar, "default-avatar.svg");
    assert_eq!(store.write_count(), 0);
}
