//! User session identity.
//!
//! The history store is namespaced by user. A session without a user id has
//! no store access at all; see [`crate::history::SessionHistory`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, non-empty user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, returning `None` for empty or whitespace-only input.
    ///
    /// Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity of whoever is using the store right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    user_id: Option<UserId>,
}

impl UserSession {
    /// A session with no signed-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Builds a session from an optional raw id; blank ids count as anonymous.
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self {
            user_id: raw.and_then(UserId::new),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
