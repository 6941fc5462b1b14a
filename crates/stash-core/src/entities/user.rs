//! User entity - an account and the credentials its sessions hang off

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Case-insensitive identifier comparison, with the same Unicode folding as `LOWER()`
pub fn identifiers_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// User entity
///
/// The password hash is deliberately not part of the entity; it is only
/// reachable through [`crate::traits::UserRepository::get_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    /// Rotated whenever the credentials change; binds password reset tokens
    /// to the password they were issued against.
    pub security_stamp: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            email_verified: false,
            security_stamp: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `identifier` names this user, by username or email (case-insensitive)
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        identifiers_match(&self.username, identifier) || identifiers_match(&self.email, identifier)
    }

    /// Update the username
    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.updated_at = Utc::now();
    }

    /// Replace the security stamp, invalidating outstanding reset tokens
    pub fn rotate_security_stamp(&mut self) {
        self.security_stamp = Uuid::new_v4();
        self.updated_at = Utc::now();
    }
}
