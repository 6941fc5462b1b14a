//! Authentication service
//!
//! Handles registration, login, token refresh (rotation) and logout.
//! Every authentication failure leaves here as the same
//! [`ServiceError::Unauthorized`]; the cause goes to the log.

use stash_common::validate_password_strength;
use stash_core::entities::User;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{AuthResponse, LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest, UserResponse};

use super::context::ServiceContext;
use super::credentials;
use super::error::{AuthFailure, ServiceError, ServiceResult};

fn unauthorized(reason: AuthFailure) -> ServiceError {
    warn!(reason = reason.as_str(), "Authentication failed");
    ServiceError::Unauthorized(reason)
}

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new user and open a session for it
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        validate_password_strength(&request.password)?;

        if self.ctx.user_repo().username_exists(&request.username).await? {
            return Err(ServiceError::conflict("Username already taken"));
        }
        if self.ctx.user_repo().email_exists(&request.email).await? {
            return Err(ServiceError::conflict("Email already registered"));
        }

        let password_hash = credentials::hash(request.password).await?;

        let user = User::new(request.username, request.email);
        // The unique indexes still catch a concurrent registration
        self.ctx.user_repo().create(&user, &password_hash).await?;

        info!(user_id = %user.id, "User registered successfully");

        self.open_session(&user).await
    }

    /// Login with username or email and password
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let Some(user) = self
            .ctx
            .user_repo()
            .find_by_identifier(&request.identifier)
            .await?
        else {
            credentials::verify_dummy(request.password).await;
            return Err(unauthorized(AuthFailure::UnknownIdentifier));
        };

        let Some(password_hash) = self.ctx.user_repo().get_password_hash(user.id).await? else {
            credentials::verify_dummy(request.password).await;
            return Err(unauthorized(AuthFailure::UnknownUser));
        };

        if !credentials::verify(request.password, password_hash).await? {
            return Err(unauthorized(AuthFailure::WrongPassword));
        }

        match self.ctx.refresh_tokens().prune_invalid(user.id).await {
            Ok(0) => {}
            Ok(pruned) => info!(user_id = %user.id, pruned, "Pruned dead refresh tokens"),
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to prune refresh tokens"),
        }

        info!(user_id = %user.id, "User logged in successfully");

        self.open_session(&user).await
    }

    /// Rotate a session: spend the refresh token, hand out a new pair
    ///
    /// The access token may be expired but must carry a valid signature;
    /// its subject scopes the refresh token lookup.
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<AuthResponse> {
        let claims = self
            .ctx
            .issuer()
            .principal_from_expired_token(&request.access_token)
            .map_err(|e| {
                warn!(error = %e, "Access token rejected during refresh");
                unauthorized(AuthFailure::InvalidAccessToken)
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| unauthorized(AuthFailure::InvalidAccessToken))?;

        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| unauthorized(AuthFailure::UnknownUser))?;

        if !self
            .ctx
            .refresh_tokens()
            .redeem(&request.refresh_token, user.id)
            .await?
        {
            return Err(unauthorized(AuthFailure::RefreshTokenRejected));
        }

        info!(user_id = %user.id, "Tokens refreshed successfully");

        self.open_session(&user).await
    }

    /// Revoke one refresh token of the caller
    ///
    /// Tokens that are unknown or belong to someone else are ignored.
    #[instrument(skip(self, request))]
    pub async fn logout(&self, user_id: Uuid, request: LogoutRequest) -> ServiceResult<()> {
        let revoked = self
            .ctx
            .refresh_tokens()
            .revoke(&request.refresh_token, user_id)
            .await?;

        info!(user_id = %user_id, revoked, "User logged out");
        Ok(())
    }

    /// Revoke every refresh token of the caller
    #[instrument(skip(self))]
    pub async fn logout_all(&self, user_id: Uuid) -> ServiceResult<()> {
        self.ctx.refresh_tokens().revoke_all(user_id).await?;
        info!(user_id = %user_id, "User logged out everywhere");
        Ok(())
    }

    /// Verify a bearer access token and return its user id
    pub fn authenticate(&self, token: &str) -> ServiceResult<Uuid> {
        let claims = self.ctx.issuer().verify(token).map_err(|e| {
            warn!(error = %e, "Bearer token rejected");
            unauthorized(AuthFailure::InvalidAccessToken)
        })?;

        claims
            .user_id()
            .map_err(|_| unauthorized(AuthFailure::InvalidAccessToken))
    }

    /// Mint an access token and a refresh token for `user`
    async fn open_session(&self, user: &User) -> ServiceResult<AuthResponse> {
        let access = self.ctx.issuer().issue(user)?;
        let refresh = self.ctx.refresh_tokens().issue(user.id).await?;

        Ok(AuthResponse::new(
            access.token,
            refresh.token,
            access.expires_at,
            UserResponse::from(user),
        ))
    }
}
