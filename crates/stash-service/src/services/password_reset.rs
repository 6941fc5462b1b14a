//! Password reset by emailed link
//!
//! Reset tokens are signed JWTs carrying the user's security stamp. The
//! stamp rotates when the password changes, which spends every reset
//! token issued before.

use stash_common::validate_password_strength;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::dto::{ForgotPasswordRequest, MessageResponse, ResetPasswordLinkQuery, ResetPasswordRequest};

use super::context::ServiceContext;
use super::credentials;
use super::error::{ServiceError, ServiceResult};
use super::mailer::PasswordResetEmail;

/// Same answer whether or not the address is known
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If your email exists in our system, a password reset link has been sent.";

const RESET_SUCCESS_MESSAGE: &str = "Your password has been reset.";

/// Append `segments` to the path of `base` and set `token`/`email` as query
fn build_link(base: &str, segments: &[&str], token: &str, email: &str) -> ServiceResult<String> {
    let mut url = Url::parse(base).map_err(|e| ServiceError::internal(format!("invalid base url {base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| ServiceError::internal(format!("base url cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("email", email);

    Ok(url.into())
}

pub struct PasswordResetService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PasswordResetService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a reset link if the address belongs to an account
    #[instrument(skip(self, request))]
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult<MessageResponse> {
        let Some(user) = self.ctx.user_repo().find_by_email(&request.email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(MessageResponse::new(FORGOT_PASSWORD_MESSAGE));
        };

        let token = self.ctx.issuer().issue_password_reset(&user)?;
        let link = build_link(
            &self.ctx.links().public_url,
            &["api", "account", "reset-password"],
            &token.token,
            &user.email,
        )?;

        let email = PasswordResetEmail {
            to: user.email.clone(),
            username: user.username.clone(),
            link,
        };
        if let Err(e) = self.ctx.mailer().send_password_reset(&email).await {
            error!(user_id = %user.id, error = %e, "Failed to send password reset email");
        } else {
            info!(user_id = %user.id, "Password reset link sent");
        }

        Ok(MessageResponse::new(FORGOT_PASSWORD_MESSAGE))
    }

    /// Where the emailed link forwards the browser to
    pub fn reset_link_redirect(&self, query: ResetPasswordLinkQuery) -> ServiceResult<String> {
        match (query.token, query.email) {
            (Some(token), Some(email)) if !token.is_empty() && !email.is_empty() => build_link(
                &self.ctx.links().frontend_url,
                &["reset-password"],
                &token,
                &email,
            ),
            _ => Err(ServiceError::InvalidResetRequest),
        }
    }

    /// Set a new password with a reset token and sign the user out everywhere
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult<MessageResponse> {
        let Some(mut user) = self.ctx.user_repo().find_by_email(&request.email).await? else {
            warn!(reason = "unknown_email", "Password reset rejected");
            return Err(ServiceError::InvalidResetRequest);
        };

        let claims = self
            .ctx
            .issuer()
            .verify_password_reset(&request.token)
            .map_err(|e| {
                warn!(user_id = %user.id, error = %e, "Password reset rejected");
                ServiceError::InvalidResetRequest
            })?;

        let current_stamp = user.security_stamp.to_string();
        if claims.user_id().ok() != Some(user.id) || claims.stamp.as_deref() != Some(current_stamp.as_str()) {
            warn!(user_id = %user.id, reason = "stale_or_foreign_token", "Password reset rejected");
            return Err(ServiceError::InvalidResetRequest);
        }

        validate_password_strength(&request.new_password)?;
        let new_hash = credentials::hash(request.new_password).await?;

        user.rotate_security_stamp();
        self.ctx
            .user_repo()
            .update_password(user.id, &new_hash, user.security_stamp)
            .await?;
        self.ctx.refresh_tokens().revoke_all(user.id).await?;

        info!(user_id = %user.id, "Password reset");
        Ok(MessageResponse::new(RESET_SUCCESS_MESSAGE))
    }
}
