//! Service context - dependency container for services
//!
//! Holds the repositories, the token issuer, the refresh token ledger and
//! the mailer. Built once at startup and shared by every request.

use std::sync::Arc;

use chrono::Duration;
use stash_common::{AccessTokenIssuer, LinkConfig};
use stash_core::traits::{RefreshTokenRepository, UserRepository};
use stash_db::{InMemoryRefreshTokenRepository, InMemoryUserRepository, PgPool};

use super::error::{ServiceError, ServiceResult};
use super::ledger::RefreshTokenLedger;
use super::mailer::{LogMailer, Mailer};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Present only with the PostgreSQL backend
    pool: Option<PgPool>,

    user_repo: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenLedger,

    issuer: Arc<AccessTokenIssuer>,
    mailer: Arc<dyn Mailer>,
    links: LinkConfig,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Get the PostgreSQL pool, if this context is backed by one
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the refresh token ledger
    pub fn refresh_tokens(&self) -> &RefreshTokenLedger {
        &self.refresh_tokens
    }

    /// Get the access token issuer
    pub fn issuer(&self) -> &AccessTokenIssuer {
        self.issuer.as_ref()
    }

    /// Get the mailer
    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// Get the public link configuration
    pub fn links(&self) -> &LinkConfig {
        &self.links
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &self.pool.as_ref().map(|_| "PgPool"))
            .field("refresh_tokens", &self.refresh_tokens)
            .field("issuer", &self.issuer)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    user_repo: Option<Arc<dyn UserRepository>>,
    refresh_token_repo: Option<Arc<dyn RefreshTokenRepository>>,
    refresh_token_lifetime: Option<Duration>,
    issuer: Option<Arc<AccessTokenIssuer>>,
    mailer: Option<Arc<dyn Mailer>>,
    links: Option<LinkConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn refresh_token_repo(mut self, repo: Arc<dyn RefreshTokenRepository>) -> Self {
        self.refresh_token_repo = Some(repo);
        self
    }

    /// Use fresh process-local repositories for users and refresh tokens
    pub fn in_memory_storage(self) -> Self {
        self.user_repo(Arc::new(InMemoryUserRepository::new()))
            .refresh_token_repo(Arc::new(InMemoryRefreshTokenRepository::new()))
    }

    pub fn refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = Some(lifetime);
        self
    }

    pub fn issuer(mut self, issuer: Arc<AccessTokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Defaults to [`LogMailer`]
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn links(mut self, links: LinkConfig) -> Self {
        self.links = Some(links);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let refresh_token_repo = self
            .refresh_token_repo
            .ok_or_else(|| ServiceError::validation("refresh_token_repo is required"))?;
        let lifetime = self
            .refresh_token_lifetime
            .ok_or_else(|| ServiceError::validation("refresh_token_lifetime is required"))?;

        Ok(ServiceContext {
            pool: self.pool,
            user_repo: self
                .user_repo
                .ok_or_else(|| ServiceError::validation("user_repo is required"))?,
            refresh_tokens: RefreshTokenLedger::new(refresh_token_repo, lifetime),
            issuer: self
                .issuer
                .ok_or_else(|| ServiceError::validation("issuer is required"))?,
            mailer: self.mailer.unwrap_or_else(|| Arc::new(LogMailer)),
            links: self
                .links
                .ok_or_else(|| ServiceError::validation("links is required"))?,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_dependencies() {
        let err = ServiceContext::builder().in_memory_storage().build().unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_in_memory_context() {
        let (ctx, _) = testing::test_context();
        assert!(ctx.pool().is_none());
        assert_eq!(ctx.refresh_tokens().lifetime(), Duration::days(7));
        assert!(!format!("{ctx:?}").contains(testing::SIGNING_KEY));
    }
}
