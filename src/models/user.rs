//! User model for storage and presence.

use serde::{Deserialize, Serialize};

/// Program value that makes a user visible to everyone.
pub const OTHER_PROGRAM: &str = "Other...";

/// A normalized position: fractions of the unscaled map surface.
///
/// Stored as a two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location(pub f64, pub f64);

impl Location {
    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }
}

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth uid (document ID)
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub user_name: Option<String>,
    /// Avatar: static asset filename or inline base64 PNG bytes
    #[serde(default)]
    pub pfp: Option<String>,
    /// `[program, campus]`
    #[serde(default)]
    pub program: Vec<String>,
    /// Normalized map location
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub has_init_profile: bool,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default, rename = "themeID")]
    pub theme_id: Option<String>,
    /// Meetups this user created
    #[serde(default)]
    pub mymeets: Vec<String>,
    /// Meetups this user belongs to (including created ones)
    #[serde(default)]
    pub joinedmeets: Vec<String>,
}

impl User {
    /// Program name (`program[0]`), if set.
    pub fn program_name(&self) -> Option<&str> {
        self.program
            .first()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
    }

    pub fn is_friend(&self, other_id: &str) -> bool {
        self.friends.iter().any(|f| f == other_id)
    }
}
