// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide publish/subscribe bus.
//!
//! Decouples independently initialized pieces (auth listener, map
//! controller, profile icon) through named events. Listeners run
//! synchronously on `emit`, in registration order, over a snapshot of the
//! listener list taken when the emit starts, so a listener that removes
//! itself (as `once` wrappers do) never causes a sibling to be skipped or
//! run twice.

use dashmap::DashMap;
use geo::Coord;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Event names understood by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AuthStateChange,
    MapClick,
    ProfilePicFound,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AuthStateChange => "AUTH_STATE_CHANGE",
            EventKind::MapClick => "MAP_CLICK",
            EventKind::ProfilePicFound => "PROFILE_PIC_FOUND",
        }
    }
}

/// An event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Signed-in user id, `None` on sign-out
    AuthStateChange(Option<String>),
    /// Screen point of a resolved click on the map surface
    MapClick(Coord<f64>),
    /// Resolved avatar source of the signed-in user
    ProfilePicFound(String),
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::AuthStateChange(_) => EventKind::AuthStateChange,
            AppEvent::MapClick(_) => EventKind::MapClick,
            AppEvent::ProfilePicFound(_) => EventKind::ProfilePicFound,
        }
    }
}

/// Identifies one registered listener for `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&AppEvent) + Send + Sync>;

struct BusInner {
    listeners: DashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

/// Cheaply cloneable handle; all clones share one registry.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Invoke every listener registered for the event's kind.
    pub fn emit(&self, event: &AppEvent) {
        let kind = event.kind();

        // Clone the list and release the shard guard before running
        // listeners; they are free to call `on`/`off` re-entrantly.
        let snapshot: Vec<Listener> = match self.inner.listeners.get(&kind) {
            Some(entry) => entry.iter().map(|(_, f)| Arc::clone(f)).collect(),
            None => return,
        };

        tracing::trace!(event = kind.as_str(), listeners = snapshot.len(), "Emitting event");

        for listener in snapshot {
            listener(event);
        }
    }

    /// Register a persistent listener.
    pub fn on<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(f))
    }

    /// Register a listener that removes itself after its first invocation.
    pub fn once<F>(&self, kind: EventKind, f: F) -> ListenerId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let fired = AtomicBool::new(false);
        // Weak so a never-fired listener doesn't keep the registry alive.
        let bus: Weak<BusInner> = Arc::downgrade(&self.inner);

        let wrapper = move |event: &AppEvent| {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(inner) = bus.upgrade() {
                EventBus { inner }.off(kind, Some(id));
            }
            f(event);
        };

        self.insert(kind, id, Arc::new(wrapper));
        id
    }

    /// Remove one listener, or every listener for `kind` when `id` is `None`.
    pub fn off(&self, kind: EventKind, id: Option<ListenerId>) {
        match id {
            Some(id) => {
                if let Some(mut entry) = self.inner.listeners.get_mut(&kind) {
                    entry.retain(|(existing, _)| *existing != id);
                }
            }
            None => {
                self.inner.listeners.remove(&kind);
            }
        }
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .listeners
            .get(&kind)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    fn register(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = self.next_id();
        self.insert(kind, id, listener);
        id
    }

    fn insert(&self, kind: EventKind, id: ListenerId, listener: Listener) {
        self.inner
            .listeners
            .entry(kind)
            .or_default()
            .push((id, listener));
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&AppEvent::AuthStateChange(None));
        assert_eq!(bus.listener_count(EventKind::AuthStateChange), 0);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let log = log.clone();
            bus.on(EventKind::ProfilePicFound, move |_| log.lock().unwrap().push(n));
        }
        bus.emit(&AppEvent::ProfilePicFound("a.svg".to_string()));

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_off_without_id_removes_all() {
        let bus = EventBus::new();
        bus.on(EventKind::MapClick, |_| {});
        bus.on(EventKind::MapClick, |_| {});
        bus.on(EventKind::AuthStateChange, |_| {});

        bus.off(EventKind::MapClick, None);

        assert_eq!(bus.listener_count(EventKind::MapClick), 0);
        assert_eq!(bus.listener_count(EventKind::AuthStateChange), 1);
    }
}
