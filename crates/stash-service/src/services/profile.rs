//! Profile use cases for the authenticated user

use stash_common::validate_password_strength;
use stash_core::entities::{identifiers_match, User};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{ChangePasswordRequest, SessionResponse, SessionsResponse, UpdateProfileRequest, UserResponse};

use super::context::ServiceContext;
use super::credentials;
use super::error::{ServiceError, ServiceResult};

pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The caller's own account
    #[instrument(skip(self))]
    pub async fn me(&self, user_id: Uuid) -> ServiceResult<UserResponse> {
        Ok(UserResponse::from(self.load(user_id).await?))
    }

    /// Change the username; omitted fields stay as they are
    #[instrument(skip(self, request))]
    pub async fn update(&self, user_id: Uuid, request: UpdateProfileRequest) -> ServiceResult<UserResponse> {
        let mut user = self.load(user_id).await?;

        if let Some(username) = request.username {
            if username != user.username {
                if !identifiers_match(&username, &user.username)
                    && self.ctx.user_repo().username_exists(&username).await?
                {
                    return Err(ServiceError::conflict("Username already taken"));
                }
                self.ctx.user_repo().update_username(user_id, &username).await?;
                user.set_username(username);
                info!(user_id = %user_id, "Username updated");
            }
        }

        Ok(UserResponse::from(user))
    }

    /// Replace the password and sign the user out everywhere
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> ServiceResult<UserResponse> {
        let mut user = self.load(user_id).await?;

        let current_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id.to_string()))?;

        if !credentials::verify(request.current_password, current_hash).await? {
            warn!(user_id = %user_id, "Password change with wrong current password");
            return Err(ServiceError::validation("Current password is incorrect"));
        }

        validate_password_strength(&request.new_password)?;
        let new_hash = credentials::hash(request.new_password).await?;

        user.rotate_security_stamp();
        self.ctx
            .user_repo()
            .update_password(user_id, &new_hash, user.security_stamp)
            .await?;
        self.ctx.refresh_tokens().revoke_all(user_id).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(UserResponse::from(user))
    }

    /// Live refresh tokens of the caller, without the tokens themselves
    #[instrument(skip(self))]
    pub async fn sessions(&self, user_id: Uuid) -> ServiceResult<SessionsResponse> {
        let active = self.ctx.refresh_tokens().list_active(user_id).await?;
        let inactive = self.ctx.refresh_tokens().list_invalid(user_id).await?;

        Ok(SessionsResponse {
            active: active.iter().map(SessionResponse::from).collect(),
            inactive_count: inactive.len(),
        })
    }

    async fn load(&self, user_id: Uuid) -> ServiceResult<User> {
        self.ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id.to_string()))
    }
}
