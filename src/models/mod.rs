// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod meetup;
pub mod prefs;
pub mod user;

pub use meetup::{CreateMeetupRequest, Meetup};
pub use prefs::{LocalStore, MapPrefs};
pub use user::{Location, User};
