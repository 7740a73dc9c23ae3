// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! UI collaborators: view-models and the traits the session drives them by.

pub mod frame;
pub mod meetup_detail;
pub mod modal;
pub mod profile_icon;

pub use frame::{FrameMessenger, LocationMessage};
pub use meetup_detail::MeetupDetail;
pub use modal::{Dialog, LogDialog, ModalProps};
pub use profile_icon::{ProfileIcon, ProfileIconView};
