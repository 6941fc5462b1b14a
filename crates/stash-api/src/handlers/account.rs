//! Account handlers
//!
//! Registration, login, token refresh, logout and password reset.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use stash_service::dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, MessageResponse,
    RefreshTokenRequest, RegisterRequest, ResetPasswordLinkQuery, ResetPasswordRequest,
};
use stash_service::{AuthService, PasswordResetService};

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// POST /api/account/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Created<Json<AuthResponse>>> {
    let service = AuthService::new(state.service_context());
    let response = service.register(request).await?;
    Ok(Created(Json(response)))
}

/// POST /api/account/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.login(request).await?;
    Ok(Json(response))
}

/// Exchange an access token (expired or not) plus a refresh token for a new pair
///
/// POST /api/account/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.refresh(request).await?;
    Ok(Json(response))
}

/// POST /api/account/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<LogoutRequest>,
) -> ApiResult<NoContent> {
    let service = AuthService::new(state.service_context());
    service.logout(auth.user_id, request).await?;
    Ok(NoContent)
}

/// POST /api/account/logout-all
pub async fn logout_all(State(state): State<AppState>, auth: AuthUser) -> ApiResult<NoContent> {
    let service = AuthService::new(state.service_context());
    service.logout_all(auth.user_id).await?;
    Ok(NoContent)
}

/// POST /api/account/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = PasswordResetService::new(state.service_context());
    let response = service.forgot_password(request).await?;
    Ok(Json(response))
}

/// Landing point of the emailed link; forwards to the frontend form
///
/// GET /api/account/reset-password?token=..&email=..
pub async fn reset_password_link(
    State(state): State<AppState>,
    Query(query): Query<ResetPasswordLinkQuery>,
) -> ApiResult<Redirect> {
    let service = PasswordResetService::new(state.service_context());
    let target = service.reset_link_redirect(query)?;
    Ok(Redirect::to(&target))
}

/// POST /api/account/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = PasswordResetService::new(state.service_context());
    let response = service.reset_password(request).await?;
    Ok(Json(response))
}
