//! Refresh token entity - one issued renewal credential

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted refresh token record
///
/// Only a SHA-256 digest of the opaque token string is stored; the plaintext
/// is handed to the client once at issuance and never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub is_revoked: bool,
}

/// Lifecycle state of a refresh token at a given instant
///
/// Used for logging why a redemption was rejected; never exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Used,
    Revoked,
    Expired,
}

impl RefreshTokenState {
    /// Short label for structured logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RefreshTokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RefreshToken {
    /// Create a fresh, unused token record
    pub fn new(user_id: Uuid, token_hash: String, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            created_at,
            expires_at,
            is_used: false,
            is_revoked: false,
        }
    }

    /// Check if token is expired at `now`
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A token may be exchanged iff it is unused, unrevoked and unexpired
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_revoked && !self.is_expired_at(now)
    }

    /// Classify the token; revocation wins over use, use over expiry
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.is_revoked {
            RefreshTokenState::Revoked
        } else if self.is_used {
            RefreshTokenState::Used
        } else if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}
