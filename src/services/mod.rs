// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod geolocation;
pub mod meetup;
pub mod prefs;
pub mod presence;

pub use geolocation::{GeolocationError, Geolocator, StaticGeolocator};
pub use meetup::{LeaveResult, MeetupService};
pub use prefs::{PreferenceError, PreferenceStore};
pub use presence::{PresenceSnapshot, PresenceSync, SyncTicket};
