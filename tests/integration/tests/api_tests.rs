//! API integration tests
//!
//! Each test starts its own server with in-memory storage; no external
//! services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use chrono::{Duration, Utc};
use integration_tests::{assert_json, assert_status, fixtures::*, TestServer};
use reqwest::StatusCode;
use serde_json::json;
use stash_core::User;

async fn register(server: &TestServer) -> (RegisterRequest, AuthResponse) {
    let request = RegisterRequest::unique();
    let response = server.post("/api/account/register", &request).await.unwrap();
    let auth = assert_json(response, StatusCode::CREATED).await.unwrap();
    (request, auth)
}

async fn load_user(server: &TestServer, auth: &AuthResponse) -> User {
    server
        .state
        .service_context()
        .user_repo()
        .find_by_id(auth.user_dto.id)
        .await
        .unwrap()
        .unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/health/ready").await.unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_register_user() {
    let server = TestServer::start().await.unwrap();
    let (request, auth) = register(&server).await;

    assert_eq!(auth.user_dto.username, request.username);
    assert_eq!(auth.user_dto.email, request.email);
    assert!(!auth.access_token.is_empty());
    assert!(!auth.refresh_token.is_empty());
}

#[tokio::test]
async fn test_register_conflicts_and_policy() {
    let server = TestServer::start().await.unwrap();
    let (request, _) = register(&server).await;

    let mut same_name = RegisterRequest::unique();
    same_name.username = request.username.to_uppercase();
    let response = server.post("/api/account/register", &same_name).await.unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();

    let mut same_email = RegisterRequest::unique();
    same_email.email = request.email.clone();
    let response = server.post("/api/account/register", &same_email).await.unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();

    let mut weak = RegisterRequest::unique();
    weak.password = "nouppercase1!".to_string();
    weak.confirm_password = weak.password.clone();
    let response = server.post("/api/account/register", &weak).await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_login_token_lifetimes() {
    let server = TestServer::start().await.unwrap();
    let (request, _) = register(&server).await;

    let before = Utc::now();
    let response = server
        .post("/api/account/login", &LoginRequest::new(&request.username, TEST_PASSWORD))
        .await
        .unwrap();
    let auth: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let access_ttl = auth.access_token_expiration - before;
    assert!(access_ttl > Duration::minutes(14), "access ttl {access_ttl}");
    assert!(access_ttl <= Duration::minutes(15) + Duration::seconds(1), "access ttl {access_ttl}");

    let response = server.get_auth("/api/profile/sessions", &auth.access_token).await.unwrap();
    let sessions: SessionsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!sessions.active.is_empty());
    for session in &sessions.active {
        assert_eq!(session.expires_at - session.created_at, Duration::days(7));
    }
}

#[tokio::test]
async fn test_login_by_email_and_legacy_field() {
    let server = TestServer::start().await.unwrap();
    let (request, _) = register(&server).await;

    let response = server
        .post("/api/account/login", &LoginRequest::new(&request.email, TEST_PASSWORD))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let legacy = json!({ "logInIdentifier": request.username, "password": TEST_PASSWORD });
    let response = server.post("/api/account/login", &legacy).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = TestServer::start().await.unwrap();
    let (request, _) = register(&server).await;

    let unknown = server
        .post("/api/account/login", &LoginRequest::new("nobody-here", TEST_PASSWORD))
        .await
        .unwrap();
    let wrong = server
        .post("/api/account/login", &LoginRequest::new(&request.username, "WrongPass123!"))
        .await
        .unwrap();

    let unknown: ErrorBody = assert_json(unknown, StatusCode::UNAUTHORIZED).await.unwrap();
    let wrong: ErrorBody = assert_json(wrong, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(unknown, wrong);
    assert_eq!(unknown.error.message, "Unauthorized");
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_replay_fails() {
    let server = TestServer::start().await.unwrap();
    let (_, first) = register(&server).await;

    let response = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&first))
        .await
        .unwrap();
    let second: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.user_dto.id, first.user_dto.id);

    let replay = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&first))
        .await
        .unwrap();
    let body: ErrorBody = assert_json(replay, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body.error.code, "UNAUTHORIZED");

    // The rotated token still works
    let response = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&second))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_refresh_single_winner() {
    let server = TestServer::start().await.unwrap();
    let (_, auth) = register(&server).await;
    let request = RefreshRequest::from_auth(&auth);

    let attempts = (0..6).map(|_| server.post("/api/account/refresh", &request));
    let statuses: Vec<StatusCode> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|response| response.unwrap().status())
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn test_refresh_token_bound_to_user() {
    let server = TestServer::start().await.unwrap();
    let (_, alice) = register(&server).await;
    let (_, bob) = register(&server).await;

    let crossed = RefreshRequest {
        access_token: bob.access_token.clone(),
        refresh_token: alice.refresh_token.clone(),
    };
    let response = server.post("/api/account/refresh", &crossed).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_refresh_with_expired_access_token() {
    let server = TestServer::start().await.unwrap();
    let (_, auth) = register(&server).await;
    let user = load_user(&server, &auth).await;

    let expired = server
        .state
        .service_context()
        .issuer()
        .issue_at(&user, Utc::now() - Duration::hours(2))
        .unwrap();

    // Useless as a bearer token...
    let response = server.get_auth("/api/profile/me", &expired.token).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    // ...but still names the principal for a refresh
    let request = RefreshRequest {
        access_token: expired.token,
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/api/account/refresh", &request).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_refresh_rejects_expired_and_unknown_tokens() {
    let server = TestServer::start().await.unwrap();
    let (_, auth) = register(&server).await;

    let stale = server
        .state
        .service_context()
        .refresh_tokens()
        .issue_at(auth.user_dto.id, Utc::now() - Duration::days(8))
        .await
        .unwrap();
    let request = RefreshRequest {
        access_token: auth.access_token.clone(),
        refresh_token: stale.token,
    };
    let response = server.post("/api/account/refresh", &request).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let request = RefreshRequest {
        access_token: auth.access_token.clone(),
        refresh_token: "bm90LWEtcmVhbC1yZWZyZXNoLXRva2Vu".to_string(),
    };
    let response = server.post("/api/account/refresh", &request).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let request = RefreshRequest {
        access_token: format!("{}x", auth.access_token),
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/api/account/refresh", &request).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = TestServer::start().await.unwrap();
    let (_, auth) = register(&server).await;

    let logout = LogoutRequest {
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server
        .post_auth("/api/account/logout", &auth.access_token, &logout)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&auth))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    // Logging out with an unknown token is not an error
    let unknown = LogoutRequest {
        refresh_token: "bm9wZQ==".to_string(),
    };
    let response = server
        .post_auth("/api/account/logout", &auth.access_token, &unknown)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
}

#[tokio::test]
async fn test_logout_all() {
    let server = TestServer::start().await.unwrap();
    let (request, first) = register(&server).await;
    let response = server
        .post("/api/account/login", &LoginRequest::new(&request.username, TEST_PASSWORD))
        .await
        .unwrap();
    let second: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_auth("/api/account/logout-all", &second.access_token, &json!({}))
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    for auth in [&first, &second] {
        let response = server
            .post("/api/account/refresh", &RefreshRequest::from_auth(auth))
            .await
            .unwrap();
        assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
    }
}

#[tokio::test]
async fn test_logout_requires_bearer() {
    let server = TestServer::start().await.unwrap();
    let (_, auth) = register(&server).await;

    let logout = LogoutRequest {
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/api/account/logout", &logout).await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(body.error.message, "Unauthorized");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_me_and_update() {
    let server = TestServer::start().await.unwrap();
    let (request, auth) = register(&server).await;
    let (taken, _) = register(&server).await;

    let response = server.get_auth("/api/profile/me", &auth.access_token).await.unwrap();
    let me: UserResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(me.username, request.username);

    let new_name = format!("renamed{}", unique_suffix());
    let response = server
        .put_auth("/api/profile/update", &auth.access_token, &json!({ "username": new_name }))
        .await
        .unwrap();
    let updated: UserResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(updated.username, new_name);

    let response = server
        .put_auth("/api/profile/update", &auth.access_token, &json!({ "username": taken.username }))
        .await
        .unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();

    let response = server
        .put_auth("/api/profile/update", &auth.access_token, &json!({ "username": "no spaces" }))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_change_password_revokes_sessions() {
    let server = TestServer::start().await.unwrap();
    let (request, auth) = register(&server).await;
    let new_password = "BrandNew456?";

    let wrong = json!({
        "currentPassword": "NotMine123!",
        "newPassword": new_password,
        "confirmPassword": new_password,
    });
    let response = server
        .put_auth("/api/profile/change-password", &auth.access_token, &wrong)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    let change = json!({
        "currentPassword": TEST_PASSWORD,
        "newPassword": new_password,
        "confirmPassword": new_password,
    });
    let response = server
        .put_auth("/api/profile/change-password", &auth.access_token, &change)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&auth))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .post("/api/account/login", &LoginRequest::new(&request.username, new_password))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_same_answer() {
    let server = TestServer::start().await.unwrap();
    let (request, _) = register(&server).await;

    let known = server
        .post("/api/account/forgot-password", &json!({ "email": request.email }))
        .await
        .unwrap();
    let unknown = server
        .post("/api/account/forgot-password", &json!({ "email": "ghost@example.com" }))
        .await
        .unwrap();

    let known: MessageResponse = assert_json(known, StatusCode::OK).await.unwrap();
    let unknown: MessageResponse = assert_json(unknown, StatusCode::OK).await.unwrap();
    assert_eq!(known.message, unknown.message);
}

#[tokio::test]
async fn test_reset_link_redirects_to_frontend() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .get("/api/account/reset-password?token=abc&email=reader%40example.com")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert_eq!(
        location,
        "http://app.stash.test/reset-password?token=abc&email=reader%40example.com"
    );

    let response = server.get("/api/account/reset-password?email=a%40b.c").await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_reset_password_single_use() {
    let server = TestServer::start().await.unwrap();
    let (request, auth) = register(&server).await;
    let user = load_user(&server, &auth).await;

    let token = server
        .state
        .service_context()
        .issuer()
        .issue_password_reset(&user)
        .unwrap()
        .token;
    let new_password = "ResetPass789#";
    let reset = json!({
        "token": token,
        "email": request.email.clone(),
        "newPassword": new_password,
        "confirmPassword": new_password,
    });

    let response = server.post("/api/account/reset-password", &reset).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post("/api/account/login", &LoginRequest::new(&request.email, new_password))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post("/api/account/refresh", &RefreshRequest::from_auth(&auth))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server.post("/api/account/reset-password", &reset).await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.message, "Invalid request");
}
