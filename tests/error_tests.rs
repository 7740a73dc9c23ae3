// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use clustr_map::error::AppError;

#[test]
fn test_membership_errors_are_user_facing() {
    for err in [
        AppError::MeetupFull("m1".to_string()),
        AppError::AlreadyMember("m1".to_string()),
        AppError::NotMember("m1".to_string()),
        AppError::CreatorMustDelete("m1".to_string()),
        AppError::NotCreator("m1".to_string()),
        AppError::Validation("Title is required".to_string()),
        AppError::Geolocation("denied".to_string()),
    ] {
        assert!(err.is_user_facing(), "{err}");
    }
}

#[test]
fn test_fetch_errors_are_not_user_facing() {
    assert!(!AppError::Database("unavailable".to_string()).is_user_facing());
    assert!(!AppError::NotFound("meetup m1".to_string()).is_user_facing());
    assert!(!AppError::Internal(anyhow::anyhow!("boom")).is_user_facing());
}

#[test]
fn test_user_messages() {
    let (title, desc) = AppError::MeetupFull("m1".to_string()).user_message();
    assert_eq!(title, "Meetup Full");
    assert!(desc.contains("full"));

    let (title, desc) = AppError::Validation("Start time must be in the future".to_string()).user_message();
    assert_eq!(title, "Invalid Meetup");
    assert_eq!(desc, "Start time must be in the future");

    // Internal details never reach the dialog
    let (_, desc) = AppError::Database("grpc status 14".to_string()).user_message();
    assert!(!desc.contains("grpc"));
}
