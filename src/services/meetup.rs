// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Meetup membership service.
//!
//! Handles the join/leave/create/delete flows behind the meetup dialog and
//! the meetup list:
//! 1. Load the meetup and apply the membership rule on the model
//! 2. Persist `attendees` and `members` together, in the same atomic
//!    update as the read from step 1
//! 3. Mirror the change into the user's `joinedmeets`/`mymeets`
//!
//! Rule violations return before any write.

use crate::db::{self, collections, fields, DocumentStore};
use crate::error::{AppError, Result};
use crate::models::meetup::LeaveOutcome;
use crate::models::{CreateMeetupRequest, Meetup, User};
use crate::time_utils;
use chrono::NaiveDateTime;
use futures_util::stream::{self, StreamExt};
use validator::Validate;

/// Maximum concurrent writes while cascading a delete.
const MAX_CONCURRENT_DB_OPS: usize = 10;

/// Result of a leave request.
#[derive(Debug, Clone)]
pub enum LeaveResult {
    /// Updated meetup after removing the user
    Left(Meetup),
    /// The creator was alone, so the meetup is gone
    Deleted,
}

/// Join/leave/create/delete operations on meetups.
#[derive(Clone)]
pub struct MeetupService<S> {
    store: S,
}

impl<S: DocumentStore> MeetupService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch a meetup by ID.
    pub async fn get(&self, meetup_id: &str) -> Result<Meetup> {
        let mut meetup = self
            .store
            .get_document::<Meetup>(collections::MEETUPS, meetup_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("meetup {}", meetup_id)))?;
        meetup.id = meetup_id.to_string();
        Ok(meetup)
    }

    /// Add `user_id` to a meetup.
    ///
    /// The capacity check and the attendee write commit together, so two
    /// racing joins can never both take the last seat.
    pub async fn join(&self, meetup_id: &str, user_id: &str) -> Result<Meetup> {
        let (id, uid) = (meetup_id.to_string(), user_id.to_string());
        let joined = self
            .store
            .update_atomic(collections::MEETUPS, meetup_id, move |doc| {
                let mut meetup = decode_meetup(&id, doc)?;
                meetup.add_attendee(&uid)?;
                Ok((membership_patch(&meetup), meetup))
            })
            .await;

        let meetup = match joined {
            Ok(meetup) => meetup,
            Err(e) => {
                tracing::info!(meetup_id, user_id, error = %e, "Join refused");
                return Err(e);
            }
        };

        self.store
            .array_union(
                collections::USERS,
                user_id,
                fields::JOINEDMEETS,
                &[meetup_id.to_string()],
            )
            .await?;

        tracing::info!(meetup_id, user_id, members = meetup.members, "Joined meetup");
        Ok(meetup)
    }

    /// Remove `user_id` from a meetup. A creator leaving alone deletes it.
    pub async fn leave(&self, meetup_id: &str, user_id: &str) -> Result<LeaveResult> {
        let (id, uid) = (meetup_id.to_string(), user_id.to_string());
        let left = self
            .store
            .update_atomic(collections::MEETUPS, meetup_id, move |doc| {
                let mut meetup = decode_meetup(&id, doc)?;
                match meetup.remove_attendee(&uid)? {
                    LeaveOutcome::Left => Ok((membership_patch(&meetup), (LeaveOutcome::Left, meetup))),
                    LeaveOutcome::DeleteMeetup => {
                        Ok((serde_json::Map::new(), (LeaveOutcome::DeleteMeetup, meetup)))
                    }
                }
            })
            .await;

        match left {
            Ok((LeaveOutcome::DeleteMeetup, meetup)) => {
                tracing::info!(meetup_id, user_id, "Creator left alone, deleting meetup");
                self.delete_loaded(&meetup, user_id).await?;
                Ok(LeaveResult::Deleted)
            }
            Ok((LeaveOutcome::Left, meetup)) => {
                self.store
                    .array_remove(
                        collections::USERS,
                        user_id,
                        fields::JOINEDMEETS,
                        &[meetup_id.to_string()],
                    )
                    .await?;

                tracing::info!(meetup_id, user_id, members = meetup.members, "Left meetup");
                Ok(LeaveResult::Left(meetup))
            }
            Err(e) => {
                tracing::info!(meetup_id, user_id, error = %e, "Leave refused");
                Err(e)
            }
        }
    }

    /// Delete a meetup. Only its creator may do this.
    pub async fn delete(&self, meetup_id: &str, user_id: &str) -> Result<()> {
        let meetup = self.get(meetup_id).await?;
        if !meetup.is_creator(user_id) {
            tracing::warn!(meetup_id, user_id, "Delete refused: not the creator");
            return Err(AppError::NotCreator(meetup_id.to_string()));
        }
        self.delete_loaded(&meetup, user_id).await
    }

    /// Delete the document, then unlink it from every attendee.
    ///
    /// The unlink writes are independent; a failed one is logged and leaves
    /// a dangling id behind rather than failing the delete.
    async fn delete_loaded(&self, meetup: &Meetup, creator_id: &str) -> Result<()> {
        self.store
            .delete_document(collections::MEETUPS, &meetup.id)
            .await?;

        let ids = [meetup.id.clone()];
        let mut unlinks: Vec<(&str, &str)> = meetup
            .attendees
            .iter()
            .map(|a| (a.as_str(), fields::JOINEDMEETS))
            .collect();
        unlinks.push((creator_id, fields::MYMEETS));

        let failures = stream::iter(unlinks)
            .map(|(user_id, field)| {
                let ids = &ids;
                async move {
                    self.store
                        .array_remove(collections::USERS, user_id, field, ids)
                        .await
                        .map_err(|e| (user_id, field, e))
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .filter_map(|r| async move { r.err() })
            .collect::<Vec<_>>()
            .await;

        for (user_id, field, e) in &failures {
            tracing::warn!(
                meetup_id = %meetup.id,
                user_id,
                field,
                error = %e,
                "Failed to unlink deleted meetup"
            );
        }

        tracing::info!(
            meetup_id = %meetup.id,
            attendees = meetup.attendees.len(),
            failed_unlinks = failures.len(),
            "Deleted meetup"
        );
        Ok(())
    }

    /// Create a meetup owned by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        request: CreateMeetupRequest,
        now: NaiveDateTime,
    ) -> Result<Meetup> {
        request
            .validate()
            .map_err(|e| AppError::Validation(validation_message(&e)))?;

        if request.title.trim().is_empty() || request.location.trim().is_empty() {
            return Err(AppError::Validation(
                "Title and location are required".to_string(),
            ));
        }

        if request.max_attendees == 0 {
            return Err(AppError::Validation(
                "Attendee limit must be at least 1, or unlimited".to_string(),
            ));
        }

        let start = time_utils::parse_meetup_start(&request.start)
            .ok_or_else(|| AppError::Validation("Invalid start time".to_string()))?;
        if start <= now {
            return Err(AppError::Validation(
                "Start time must be in the future".to_string(),
            ));
        }

        let owner = match self
            .store
            .get_document::<User>(collections::USERS, user_id)
            .await
        {
            Ok(Some(user)) => user.display_name().to_string(),
            Ok(None) => "Anonymous".to_string(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to fetch organizer name");
                "Anonymous".to_string()
            }
        };

        let mut meetup = Meetup {
            id: String::new(),
            title: request.title.trim().to_string(),
            location: request.location.trim().to_string(),
            pin: request.pin,
            start: request.start.trim().to_string(),
            end: String::new(),
            details: request.details.trim().to_string(),
            max_attendees: request.max_attendees,
            members: 1,
            attendees: vec![user_id.to_string()],
            owner,
        };

        let meetup_id = self
            .store
            .add_document(collections::MEETUPS, &meetup)
            .await?;
        meetup.id = meetup_id.clone();

        let ids = [meetup_id.clone()];
        self.store
            .array_union(collections::USERS, user_id, fields::MYMEETS, &ids)
            .await?;
        self.store
            .array_union(collections::USERS, user_id, fields::JOINEDMEETS, &ids)
            .await?;

        tracing::info!(meetup_id = %meetup_id, user_id, "Created meetup");
        Ok(meetup)
    }

    /// Meetups `user_id` could still join: not theirs, with space, upcoming.
    pub async fn available_for(&self, user_id: &str, now: NaiveDateTime) -> Result<Vec<Meetup>> {
        let mut meetups: Vec<Meetup> = db::list_decoded::<S, Meetup>(&self.store, collections::MEETUPS)
            .await?
            .into_iter()
            .filter(|m| !m.is_member(user_id) && m.has_space())
            .filter(|m| matches!(time_utils::parse_meetup_start(&m.start), Some(start) if start > now))
            .collect();

        meetups.sort_by(|a, b| {
            time_utils::parse_meetup_start(&a.start).cmp(&time_utils::parse_meetup_start(&b.start))
        });
        Ok(meetups)
    }
}

/// Decode a meetup read inside an atomic update.
fn decode_meetup(meetup_id: &str, doc: Option<serde_json::Value>) -> Result<Meetup> {
    let doc = doc.ok_or_else(|| AppError::NotFound(format!("meetup {}", meetup_id)))?;
    let mut meetup: Meetup = serde_json::from_value(doc)
        .map_err(|e| AppError::Database(format!("Failed to decode {}: {}", meetup_id, e)))?;
    meetup.id = meetup_id.to_string();
    Ok(meetup)
}

/// `attendees` and `members` written together so they never disagree.
fn membership_patch(meetup: &Meetup) -> serde_json::Map<String, serde_json::Value> {
    let mut patch = serde_json::Map::new();
    patch.insert(
        fields::ATTENDEES.to_string(),
        serde_json::Value::from(meetup.attendees.clone()),
    );
    patch.insert(
        fields::MEMBERS.to_string(),
        serde_json::Value::from(meetup.members),
    );
    patch
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {}", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
