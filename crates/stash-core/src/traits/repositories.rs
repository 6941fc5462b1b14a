//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL or in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{RefreshToken, RefreshTokenState, User};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Find user by username or email, case-insensitive
    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<User>>;

    /// Find user by email, case-insensitive
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Check if username is already taken (case-insensitive)
    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    /// Check if email is already taken (case-insensitive)
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Create a new user
    ///
    /// Fails with a conflict error if the username or email is taken.
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()>;

    /// Change the username
    async fn update_username(&self, id: Uuid, username: &str) -> RepoResult<()>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: Uuid) -> RepoResult<Option<String>>;

    /// Replace the password hash and security stamp together
    async fn update_password(&self, id: Uuid, password_hash: &str, security_stamp: Uuid) -> RepoResult<()>;
}

// ============================================================================
// Refresh Token Repository
// ============================================================================

/// Result of an atomic redemption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The token was valid and is now marked used
    Redeemed,
    /// Nothing matched the hash for that user
    NotFound,
    /// The token exists but is no longer exchangeable
    Rejected(RefreshTokenState),
}

impl RedeemOutcome {
    pub fn is_redeemed(self) -> bool {
        matches!(self, Self::Redeemed)
    }
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a newly issued token
    async fn create(&self, token: &RefreshToken) -> RepoResult<()>;

    /// Atomically check and consume a token owned by `user_id`
    ///
    /// The validity check and the `is_used` transition must happen as one
    /// step: two concurrent calls for the same token yield at most one
    /// [`RedeemOutcome::Redeemed`].
    async fn redeem(&self, token_hash: &str, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<RedeemOutcome>;

    /// Revoke one token owned by `user_id`; returns whether a row changed
    async fn revoke(&self, token_hash: &str, user_id: Uuid) -> RepoResult<bool>;

    /// Revoke every outstanding token of a user; returns the count
    async fn revoke_all_for_user(&self, user_id: Uuid) -> RepoResult<u64>;

    /// Tokens of a user that are still exchangeable at `now`
    async fn list_active(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>>;

    /// Tokens of a user that are used, revoked or expired at `now`
    async fn list_invalid(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>>;

    /// Delete tokens by id; returns the count
    async fn delete_by_ids(&self, ids: &[Uuid]) -> RepoResult<u64>;

    /// Delete every token whose expiry has passed; returns the count
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}
