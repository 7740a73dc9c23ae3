// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navbar profile icon, updated from `PROFILE_PIC_FOUND`.

use crate::events::{AppEvent, EventBus, EventKind, ListenerId};
use crate::map::pin::PLACEHOLDER_AVATAR;
use serde::Serialize;
use std::sync::{Arc, Mutex};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileIconView {
    pub src: String,
}

pub struct ProfileIcon {
    src: Arc<Mutex<Option<String>>>,
    bus: EventBus,
    listener: ListenerId,
}

impl ProfileIcon {
    /// Subscribe to avatar updates on `bus`.
    pub fn attach(bus: &EventBus) -> Self {
        let src = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&src);
        let listener = bus.on(EventKind::ProfilePicFound, move |event| {
            if let AppEvent::ProfilePicFound(found) = event {
                *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(found.clone());
            }
        });

        Self {
            src,
            bus: bus.clone(),
            listener,
        }
    }

    pub fn render(&self) -> ProfileIconView {
        let src = self.src.lock().unwrap_or_else(|e| e.into_inner()).clone();
        ProfileIconView {
            src: src.unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        }
    }
}

impl Drop for ProfileIcon {
    fn drop(&mut self) {
        self.bus.off(EventKind::ProfilePicFound, Some(self.listener));
    }
}
