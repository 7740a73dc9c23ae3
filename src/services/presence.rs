// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presence synchronizer: decides which peers and meetups appear on the map.
//!
//! Loading is separated from applying. Every sync takes a generation ticket
//! and the caller only applies a snapshot whose ticket is still current, so
//! a slow response can never overwrite a newer one.

use crate::db::{self, collections, DocumentStore};
use crate::map::pin::{PinId, PinKind, PinLayer, PLACEHOLDER_AVATAR};
use crate::models::user::OTHER_PROGRAM;
use crate::models::{Location, Meetup, User};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Avatar values with these extensions are static assets, not inline bytes.
const STATIC_ASSET_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

const INLINE_PNG_PREFIX: &str = "data:image/png;base64,";

/// Whether `candidate` is shown on `viewer`'s map.
///
/// Requires a completed profile and either a shared program, the
/// `"Other..."` program on either side, or mutual friendship.
pub fn is_visible(viewer: &User, candidate: &User) -> bool {
    if candidate.id == viewer.id || !candidate.has_init_profile {
        return false;
    }

    let viewer_program = viewer.program_name();
    let candidate_program = candidate.program_name();

    let either_other =
        viewer_program == Some(OTHER_PROGRAM) || candidate_program == Some(OTHER_PROGRAM);
    let same_program = viewer_program.is_some() && viewer_program == candidate_program;
    let mutual_friends = viewer.is_friend(&candidate.id) && candidate.is_friend(&viewer.id);

    either_other || same_program || mutual_friends
}

/// Turn a stored `pfp` value into an image source.
pub fn resolve_avatar(pfp: Option<&str>) -> String {
    let pfp = match pfp.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pfp) => pfp,
        None => return PLACEHOLDER_AVATAR.to_string(),
    };

    if pfp.starts_with("data:") {
        return pfp.to_string();
    }

    let lower = pfp.to_ascii_lowercase();
    if STATIC_ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return pfp.to_string();
    }

    match STANDARD.decode(pfp) {
        Ok(_) => format!("{}{}", INLINE_PNG_PREFIX, pfp),
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable inline avatar, using placeholder");
            PLACEHOLDER_AVATAR.to_string()
        }
    }
}

/// One visible peer.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPresence {
    pub user_id: String,
    pub name: String,
    pub avatar: String,
    pub location: Location,
}

/// Signed-in user's own pin data.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfPresence {
    pub avatar: String,
    pub location: Location,
}

/// Everything one sync loaded.
#[derive(Debug, Clone, Default)]
pub struct PresenceSnapshot {
    pub me: Option<SelfPresence>,
    pub peers: Vec<PeerPresence>,
    pub meetups: Vec<Meetup>,
}

impl PresenceSnapshot {
    /// Rebuild the remote pins of `layer` and refresh the self pin.
    pub fn apply(&self, layer: &mut PinLayer, self_pin: PinId, unscaled: (f64, f64)) {
        layer.clear_remote();

        if let (Some(me), Some(pin)) = (&self.me, layer.get_mut(self_pin)) {
            pin.set_image_src(Some(me.avatar.clone()));
            pin.set_normalized(me.location.x(), me.location.y(), unscaled);
            pin.visible = true;
        }

        for peer in &self.peers {
            let id = layer.create_pin(
                PinKind::Peer(peer.user_id.clone()),
                Some(&peer.avatar),
                Some(&peer.name),
            );
            if let Some(pin) = layer.get_mut(id) {
                pin.set_normalized(peer.location.x(), peer.location.y(), unscaled);
            }
        }

        for meetup in &self.meetups {
            let Some(location) = meetup.pin else {
                tracing::debug!(meetup_id = %meetup.id, "Meetup has no map pin, skipping");
                continue;
            };
            let id = layer.create_pin(PinKind::Meetup(meetup.id.clone()), None, Some(&meetup.title));
            if let Some(pin) = layer.get_mut(id) {
                pin.set_normalized(location.x(), location.y(), unscaled);
            }
        }
    }
}

/// Generation ticket for one sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u64);

impl SyncTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Loads presence from the document store.
#[derive(Clone)]
pub struct PresenceSync<S> {
    store: S,
    generation: Arc<AtomicU64>,
}

impl<S: DocumentStore> PresenceSync<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a new sync, invalidating every earlier ticket.
    pub fn begin(&self) -> SyncTicket {
        SyncTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SyncTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Fetch and filter everything visible to `viewer_id`.
    ///
    /// Fetch failures are logged and shrink the snapshot; they never fail
    /// the whole load.
    pub async fn load(&self, viewer_id: &str) -> PresenceSnapshot {
        let viewer = match self
            .store
            .get_document::<User>(collections::USERS, viewer_id)
            .await
        {
            Ok(Some(mut user)) => {
                user.id = viewer_id.to_string();
                Some(user)
            }
            Ok(None) => {
                tracing::warn!(user_id = viewer_id, "Viewer profile not found");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = viewer_id, error = %e, "Failed to fetch viewer profile");
                None
            }
        };

        let me = viewer.as_ref().map(|user| SelfPresence {
            avatar: resolve_avatar(user.pfp.as_deref()),
            location: user.location,
        });

        // An unreadable viewer still sees "Other..." users
        let viewer = viewer.unwrap_or_else(|| User {
            id: viewer_id.to_string(),
            ..Default::default()
        });

        let peers: Vec<PeerPresence> = self
            .fetch_all::<User>(collections::USERS)
            .await
            .into_iter()
            .filter(|candidate| is_visible(&viewer, candidate))
            .map(|user| PeerPresence {
                avatar: resolve_avatar(user.pfp.as_deref()),
                name: user.display_name().to_string(),
                location: user.location,
                user_id: user.id,
            })
            .collect();

        let meetups: Vec<Meetup> = self
            .fetch_all::<Meetup>(collections::MEETUPS)
            .await
            .into_iter()
            .filter(|m| !m.start.trim().is_empty())
            .collect();

        tracing::info!(
            user_id = viewer_id,
            peers = peers.len(),
            meetups = meetups.len(),
            "Presence loaded"
        );

        PresenceSnapshot { me, peers, meetups }
    }

    /// Fetch a collection; a failed listing degrades to an empty one.
    async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        match db::list_decoded(&self.store, collection).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(collection, error = %e, "Failed to fetch documents");
                Vec::new()
            }
        }
    }
}
