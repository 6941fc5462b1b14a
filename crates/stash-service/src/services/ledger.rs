//! Refresh token ledger
//!
//! Issues opaque single-use refresh tokens and redeems them atomically.
//! Only the SHA-256 of a token is stored; every lookup hashes the
//! presented string first.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use stash_common::{generate_refresh_token, hash_refresh_token};
use stash_core::entities::RefreshToken;
use stash_core::traits::{RedeemOutcome, RefreshTokenRepository};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};

/// A freshly minted token: the plaintext for the client and the stored record
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub record: RefreshToken,
}

#[derive(Clone)]
pub struct RefreshTokenLedger {
    repo: Arc<dyn RefreshTokenRepository>,
    lifetime: Duration,
}

impl RefreshTokenLedger {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, lifetime: Duration) -> Self {
        Self { repo, lifetime }
    }

    /// How long issued tokens stay redeemable
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a new token for `user_id`, valid from now
    pub async fn issue(&self, user_id: Uuid) -> ServiceResult<IssuedRefreshToken> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// Issue a new token as if created at `created_at`
    #[instrument(skip(self))]
    pub async fn issue_at(&self, user_id: Uuid, created_at: DateTime<Utc>) -> ServiceResult<IssuedRefreshToken> {
        let expires_at = created_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| ServiceError::internal("refresh token expiry is out of range"))?;
        let token = generate_refresh_token();
        let record = RefreshToken::new(user_id, hash_refresh_token(&token), created_at, expires_at);

        self.repo.create(&record).await?;
        debug!(token_id = %record.id, expires_at = %record.expires_at, "Refresh token issued");

        Ok(IssuedRefreshToken { token, record })
    }

    /// Consume `token` on behalf of `user_id`
    ///
    /// Returns `false` when the token is unknown, belongs to someone else,
    /// or is used, revoked or expired. The reason is logged only.
    #[instrument(skip(self, token))]
    pub async fn redeem(&self, token: &str, user_id: Uuid) -> ServiceResult<bool> {
        let outcome = self
            .repo
            .redeem(&hash_refresh_token(token), user_id, Utc::now())
            .await?;

        match outcome {
            RedeemOutcome::Redeemed => Ok(true),
            RedeemOutcome::NotFound => {
                warn!(reason = "not_found", "Refresh token rejected");
                Ok(false)
            }
            RedeemOutcome::Rejected(state) => {
                warn!(reason = %state, "Refresh token rejected");
                Ok(false)
            }
        }
    }

    /// Revoke one token of `user_id`; unknown tokens are ignored
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str, user_id: Uuid) -> ServiceResult<bool> {
        Ok(self.repo.revoke(&hash_refresh_token(token), user_id).await?)
    }

    /// Revoke every token of `user_id`
    #[instrument(skip(self))]
    pub async fn revoke_all(&self, user_id: Uuid) -> ServiceResult<u64> {
        let revoked = self.repo.revoke_all_for_user(user_id).await?;
        info!(revoked, "Refresh tokens revoked");
        Ok(revoked)
    }

    pub async fn list_active(&self, user_id: Uuid) -> ServiceResult<Vec<RefreshToken>> {
        Ok(self.repo.list_active(user_id, Utc::now()).await?)
    }

    pub async fn list_invalid(&self, user_id: Uuid) -> ServiceResult<Vec<RefreshToken>> {
        Ok(self.repo.list_invalid(user_id, Utc::now()).await?)
    }

    /// Delete the used, revoked and expired tokens of one user
    #[instrument(skip(self))]
    pub async fn prune_invalid(&self, user_id: Uuid) -> ServiceResult<u64> {
        let ids: Vec<Uuid> = self
            .list_invalid(user_id)
            .await?
            .iter()
            .map(|token| token.id)
            .collect();

        Ok(self.repo.delete_by_ids(&ids).await?)
    }

    /// Delete every expired token, whoever owns it
    pub async fn delete_expired(&self) -> ServiceResult<u64> {
        Ok(self.repo.delete_expired(Utc::now()).await?)
    }
}

impl std::fmt::Debug for RefreshTokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenLedger")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
