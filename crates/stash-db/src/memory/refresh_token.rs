//! In-memory implementation of RefreshTokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use stash_core::entities::RefreshToken;
use stash_core::error::DomainError;
use stash_core::traits::{RedeemOutcome, RefreshTokenRepository, RepoResult};

/// Refresh tokens keyed by token hash
///
/// `redeem` holds the shard lock for the entry while it checks and marks
/// the token, which gives the same single-winner guarantee as the
/// conditional UPDATE in PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: DashMap<String, RefreshToken>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, whatever their state
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn collect_for(&self, user_id: Uuid, keep: impl Fn(&RefreshToken) -> bool) -> Vec<RefreshToken> {
        let mut tokens: Vec<RefreshToken> = self
            .tokens
            .iter()
            .filter(|entry| entry.user_id == user_id && keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tokens
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: &RefreshToken) -> RepoResult<()> {
        match self.tokens.entry(token.token_hash.clone()) {
            Entry::Occupied(_) => Err(DomainError::RefreshTokenExists),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn redeem(&self, token_hash: &str, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<RedeemOutcome> {
        let Some(mut token) = self.tokens.get_mut(token_hash) else {
            return Ok(RedeemOutcome::NotFound);
        };

        if token.user_id != user_id {
            return Ok(RedeemOutcome::NotFound);
        }
        if !token.is_valid_at(now) {
            return Ok(RedeemOutcome::Rejected(token.state_at(now)));
        }

        token.is_used = true;
        Ok(RedeemOutcome::Redeemed)
    }

    async fn revoke(&self, token_hash: &str, user_id: Uuid) -> RepoResult<bool> {
        Ok(match self.tokens.get_mut(token_hash) {
            Some(mut token) if token.user_id == user_id && !token.is_revoked => {
                token.is_revoked = true;
                true
            }
            _ => false,
        })
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut revoked = 0;
        for mut token in self.tokens.iter_mut() {
            if token.user_id == user_id && !token.is_revoked {
                token.is_revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn list_active(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>> {
        Ok(self.collect_for(user_id, |token| token.is_valid_at(now)))
    }

    async fn list_invalid(&self, user_id: Uuid, now: DateTime<Utc>) -> RepoResult<Vec<RefreshToken>> {
        Ok(self.collect_for(user_id, |token| !token.is_valid_at(now)))
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> RepoResult<u64> {
        let mut deleted = 0;
        self.tokens.retain(|_, token| {
            let remove = ids.contains(&token.id);
            if remove {
                deleted += 1;
            }
            !remove
        });
        Ok(deleted)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut deleted = 0;
        self.tokens.retain(|_, token| {
            let expired = token.is_expired_at(now);
            if expired {
                deleted += 1;
            }
            !expired
        });
        Ok(deleted)
    }
}
