// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meetup model and membership rules.
//!
//! `attendees[0]` is always the creator and `members` always equals
//! `attendees.len()` once a mutation completes. The mutators here enforce
//! both; the meetup service only persists their results.

use crate::error::AppError;
use crate::models::Location;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cap value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Meetup stored in Firestore (`meetups/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meetup {
    /// Document ID
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: String,
    pub title: String,
    /// Free-text location label
    #[serde(default)]
    pub location: String,
    /// Normalized pin position on the campus map
    #[serde(default)]
    pub pin: Option<Location>,
    /// Start date/time (`YYYY-MM-DDTHH:MM` or RFC3339)
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub details: String,
    #[serde(default = "unlimited")]
    pub max_attendees: i64,
    #[serde(default)]
    pub members: u32,
    /// Ordered attendee ids; index 0 is the creator
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Organizer display name
    #[serde(default)]
    pub owner: String,
}

fn unlimited() -> i64 {
    UNLIMITED
}

/// Outcome of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Attendee removed, meetup remains
    Left,
    /// Creator was alone; the meetup must be deleted
    DeleteMeetup,
}

impl Meetup {
    pub fn creator(&self) -> Option<&str> {
        self.attendees.first().map(String::as_str)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator() == Some(user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|a| a == user_id)
    }

    pub fn is_capped(&self) -> bool {
        self.max_attendees > 0
    }

    pub fn has_space(&self) -> bool {
        !self.is_capped() || (self.members as i64) < self.max_attendees
    }

    /// `"n"` or `"n/cap"`.
    pub fn attendance_label(&self) -> String {
        if self.is_capped() {
            format!("{}/{}", self.members, self.max_attendees)
        } else {
            self.members.to_string()
        }
    }

    pub fn can_join(&self, user_id: &str) -> bool {
        !self.is_member(user_id) && self.has_space()
    }

    pub fn can_leave(&self, user_id: &str) -> bool {
        self.is_member(user_id) && !self.is_creator(user_id)
    }

    /// Append `user_id` to the attendee list.
    pub fn add_attendee(&mut self, user_id: &str) -> Result<(), AppError> {
        if self.is_member(user_id) {
            return Err(AppError::AlreadyMember(self.id.clone()));
        }
        if !self.has_space() {
            return Err(AppError::MeetupFull(self.id.clone()));
        }
        self.attendees.push(user_id.to_string());
        self.members = self.attendees.len() as u32;
        Ok(())
    }

    /// Remove `user_id` from the attendee list.
    ///
    /// The creator may only "leave" when alone, which the caller turns into
    /// a delete; the attendee list is left untouched in that case.
    pub fn remove_attendee(&mut self, user_id: &str) -> Result<LeaveOutcome, AppError> {
        if !self.is_member(user_id) {
            return Err(AppError::NotMember(self.id.clone()));
        }
        if self.is_creator(user_id) {
            return if self.attendees.len() == 1 {
                Ok(LeaveOutcome::DeleteMeetup)
            } else {
                Err(AppError::CreatorMustDelete(self.id.clone()))
            };
        }
        self.attendees.retain(|a| a != user_id);
        self.members = self.attendees.len() as u32;
        Ok(LeaveOutcome::Left)
    }
}

/// Fields submitted by the create-meetup form.
#[derive(Debug, Clone, Validate)]
pub struct CreateMeetupRequest {
    #[validate(length(min = 1, max = 80, message = "Title is required (max 80 characters)"))]
    pub title: String,
    #[validate(length(min = 1, max = 120, message = "Location is required (max 120 characters)"))]
    pub location: String,
    /// Picked on the embedded map, if any
    pub pin: Option<Location>,
    /// Datetime-local value, `YYYY-MM-DDTHH:MM`
    #[validate(length(min = 1, message = "Start time is required"))]
    pub start: String,
    #[validate(length(max = 500, message = "Details are limited to 500 characters"))]
    pub details: String,
    #[validate(range(min = -1, max = 500, message = "Invalid attendee limit"))]
    pub max_attendees: i64,
}
