// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meetup detail dialog shown when a meetup pin is clicked.

use crate::models::Meetup;
use crate::time_utils;
use chrono::NaiveDateTime;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MeetupDetail {
    pub meetup_id: String,
    pub title: String,
    pub organizer: String,
    /// `"n"` or `"n/cap"`
    pub attendance: String,
    pub location: String,
    pub start: String,
    pub details: String,
    pub join_enabled: bool,
    pub leave_enabled: bool,
    pub delete_enabled: bool,
}

impl MeetupDetail {
    pub fn new(meetup: &Meetup, viewer_id: &str, now: NaiveDateTime) -> Self {
        let organizer = if meetup.owner.trim().is_empty() {
            "Anonymous".to_string()
        } else {
            meetup.owner.clone()
        };

        Self {
            meetup_id: meetup.id.clone(),
            title: meetup.title.clone(),
            organizer,
            attendance: meetup.attendance_label(),
            location: meetup.location.clone(),
            start: time_utils::display_meetup_start(&meetup.start, now),
            details: meetup.details.clone(),
            join_enabled: meetup.can_join(viewer_id),
            leave_enabled: meetup.can_leave(viewer_id),
            delete_enabled: meetup.is_creator(viewer_id),
        }
    }
}
