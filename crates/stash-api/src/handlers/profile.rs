//! Profile handlers for the authenticated caller

use axum::{extract::State, Json};
use stash_service::dto::{ChangePasswordRequest, SessionsResponse, UpdateProfileRequest, UserResponse};
use stash_service::ProfileService;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /api/profile/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let service = ProfileService::new(state.service_context());
    let response = service.me(auth.user_id).await?;
    Ok(Json(response))
}

/// PUT /api/profile/update
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let service = ProfileService::new(state.service_context());
    let response = service.update(auth.user_id, request).await?;
    Ok(Json(response))
}

/// PUT /api/profile/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<UserResponse>> {
    let service = ProfileService::new(state.service_context());
    let response = service.change_password(auth.user_id, request).await?;
    Ok(Json(response))
}

/// GET /api/profile/sessions
pub async fn sessions(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<SessionsResponse>> {
    let service = ProfileService::new(state.service_context());
    let response = service.sessions(auth.user_id).await?;
    Ok(Json(response))
}
