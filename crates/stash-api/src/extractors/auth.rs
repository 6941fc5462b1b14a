//! Bearer token extractor
//!
//! Verifies the access token in the `Authorization` header and yields the
//! user id it was issued to. Any problem is the same 401 as every other
//! authentication failure.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use stash_service::{AuthFailure, AuthService, ServiceError};
use uuid::Uuid;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    tracing::warn!(reason = AuthFailure::MissingBearer.as_str(), "Authentication failed");
                    ServiceError::Unauthorized(AuthFailure::MissingBearer)
                })?;

        let app_state = AppState::from_ref(state);
        let user_id = AuthService::new(app_state.service_context()).authenticate(bearer.token())?;

        Ok(Self { user_id })
    }
}
