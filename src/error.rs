// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent user-facing messages.

/// Application error type shared by the store, services and session.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Meetup {0} is full")]
    MeetupFull(String),

    #[error("Already a member of meetup {0}")]
    AlreadyMember(String),

    #[error("Not a member of meetup {0}")]
    NotMember(String),

    #[error("Creator must delete meetup {0} instead of leaving")]
    CreatorMustDelete(String),

    #[error("Only the creator may delete meetup {0}")]
    NotCreator(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error should be surfaced to the user through a dialog
    /// rather than only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::MeetupFull(_)
                | AppError::AlreadyMember(_)
                | AppError::NotMember(_)
                | AppError::CreatorMustDelete(_)
                | AppError::NotCreator(_)
                | AppError::Validation(_)
                | AppError::Geolocation(_)
        )
    }

    /// Dialog title and body for this error.
    pub fn user_message(&self) -> (&'static str, String) {
        match self {
            AppError::MeetupFull(_) => ("Meetup Full", "Sorry, this meetup is full!".to_string()),
            AppError::AlreadyMember(_) => (
                "Already Joined",
                "You are already part of this meetup.".to_string(),
            ),
            AppError::NotMember(_) => (
                "Not Joined",
                "You are not part of this meetup.".to_string(),
            ),
            AppError::CreatorMustDelete(_) => (
                "Can't Leave",
                "You created this meetup. Delete it instead of leaving.".to_string(),
            ),
            AppError::NotCreator(_) => (
                "Can't Delete",
                "Only the organizer can delete this meetup.".to_string(),
            ),
            AppError::Validation(msg) => ("Invalid Meetup", msg.clone()),
            AppError::Geolocation(msg) => ("Location Unavailable", msg.clone()),
            AppError::NotFound(_) => (
                "Not Found",
                "That item no longer exists.".to_string(),
            ),
            AppError::BadRequest(msg) => ("Invalid Request", msg.clone()),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("Something Went Wrong", "Please try again.".to_string())
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                ("Something Went Wrong", "Please try again.".to_string())
            }
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
