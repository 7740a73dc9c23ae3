// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Clustr Map: the campus map and presence layer of the Clustr social app
//!
//! This crate coordinates the interactive campus map: the event bus, map
//! coordinate transforms and gestures, pin view-models, presence of peers
//! and meetups loaded from Firestore, and the meetup membership flows
//! driven from the map.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod map;
pub mod models;
pub mod services;
pub mod session;
pub mod time_utils;
pub mod ui;

pub use session::{LocationMode, MapSession, PointerUpResult};
