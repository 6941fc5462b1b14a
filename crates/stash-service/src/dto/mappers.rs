//! Entity to DTO mappers

use stash_core::entities::{RefreshToken, User};

use super::responses::{SessionResponse, UserResponse};

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            date_joined: user.created_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

impl From<&RefreshToken> for SessionResponse {
    fn from(token: &RefreshToken) -> Self {
        Self {
            id: token.id,
            created_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}
