//! PostgreSQL implementation of RefreshTokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use stash_core::entities::RefreshToken;
use stash_core::error::DomainError;
use stash_core::traits::{RedeemOutcome, RefreshTokenRepository, RepoResult};

use crate::models::RefreshTokenModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of RefreshTokenRepository
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new PgRefreshTokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read-only lookup used to explain a failed redemption
    async fn find_owned(&self, token_hash: &str, user_id: Uuid) -> RepoResult<Option<RefreshToken>> {
        let result = sqlx::query_as::<_, RefreshTokenModel>(
            r"
            SELECT id, user_id, token_hash, created_at, expires_at, is_used, is_revoked
            FROM refresh_tokens
            WHERE token_hash = $1 AND user_id = $2
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(RefreshToken::from))
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    #[instrument(skip(self, token), fields(user_id = %token.user_id))]
    async fn create(&self, token: &RefreshToken) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO refresh_tokens (id, user_id, token_hash, created_at, expires_at, is_used, is_revoked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.is_used)
        .bind(token.is_revoked)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::RefreshTokenExists))?;

        Ok(())
    }

    #[instrument(skip(self, token_hash))]
    async fn redeem(&self, token_hash: &str, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<RedeemOutcome> {
        // Check and consume in one statement; concurrent callers race on the row lock
        let redeemed = sqlx::query_scalar::<_, Uuid>(
            r"
            UPDATE refresh_tokens
            SET is_used = TRUE, used_at = NOW()
            WHERE token_hash = $1
              AND user_id = $2
              AND NOT is_used
              AND NOT is_revoked
              AND expires_at > $3
            RETURNING id
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(id) = redeemed {
            debug!(token_id = %id, "Refresh token consumed");
            return Ok(RedeemOutcome::Redeemed);
        }

        Ok(match self.find_owned(token_hash, user_id).await? {
            Some(token) => RedeemOutcome::Rejected(token.state_at(now)),
            None => RedeemOutcome::NotFound,
        })
    }

    #[instrument(skip(self, token_hash))]
    async fn revoke(&self, token_hash: &str, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = NOW()
            WHERE token_hash = $1 AND user_id = $2 AND NOT is_revoked
            ",
        )
        .bind(token_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn revoke_all_for_user(&self, user_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1 AND NOT is_revoked
            ",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_active(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>> {
        let rows = sqlx::query_as::<_, RefreshTokenModel>(
            r"
            SELECT id, user_id, token_hash, created_at, expires_at, is_used, is_revoked
            FROM refresh_tokens
            WHERE user_id = $1 AND NOT is_used AND NOT is_revoked AND expires_at > $2
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(RefreshToken::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_invalid(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>> {
        let rows = sqlx::query_as::<_, RefreshTokenModel>(
            r"
            SELECT id, user_id, token_hash, created_at, expires_at, is_used, is_revoked
            FROM refresh_tokens
            WHERE user_id = $1 AND (is_used OR is_revoked OR expires_at <= $2)
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(RefreshToken::from).collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_by_ids(&self, ids: &[Uuid]) -> RepoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r"
            DELETE FROM refresh_tokens WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM refresh_tokens WHERE expires_at <= $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
