//! Route definitions

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{account, health, profile};
use crate::state::AppState;

/// Account and profile routes under /api
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}

/// Health check routes (kept apart so rate limiting does not apply)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_routes() -> Router<AppState> {
    Router::new().merge(account_routes()).merge(profile_routes())
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/register", post(account::register))
        .route("/account/login", post(account::login))
        .route("/account/refresh", post(account::refresh))
        .route("/account/logout", post(account::logout))
        .route("/account/logout-all", post(account::logout_all))
        .route("/account/forgot-password", post(account::forgot_password))
        .route(
            "/account/reset-password",
            get(account::reset_password_link).post(account::reset_password),
        )
}

fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/me", get(profile::me))
        .route("/profile/update", put(profile::update))
        .route("/profile/change-password", put(profile::change_password))
        .route("/profile/sessions", get(profile::sessions))
}
