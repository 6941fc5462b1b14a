//! In-memory implementation of UserRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use stash_core::entities::{identifiers_match, User};
use stash_core::error::DomainError;
use stash_core::traits::{RepoResult, UserRepository};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// Users kept in a single map behind a lock, so uniqueness checks and
/// inserts happen together
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, StoredUser>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .read()
            .values()
            .find(|stored| predicate(&stored.user))
            .map(|stored| stored.user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<User>> {
        Ok(self.find(|user| user.matches_identifier(identifier)))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.find(|user| identifiers_match(&user.email, email)))
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        Ok(self.find(|user| identifiers_match(&user.username, username)).is_some())
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.find(|user| identifiers_match(&user.email, email)).is_some())
    }

    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        let mut users = self.users.write();

        for stored in users.values() {
            if identifiers_match(&stored.user.username, &user.username) {
                return Err(DomainError::UsernameAlreadyExists);
            }
            if identifiers_match(&stored.user.email, &user.email) {
                return Err(DomainError::EmailAlreadyExists);
            }
        }

        users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    async fn update_username(&self, id: Uuid, username: &str) -> RepoResult<()> {
        let mut users = self.users.write();

        let taken = users
            .values()
            .any(|stored| stored.user.id != id && identifiers_match(&stored.user.username, username));
        if taken {
            return Err(DomainError::UsernameAlreadyExists);
        }

        let stored = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        stored.user.set_username(username.to_string());
        Ok(())
    }

    async fn get_password_hash(&self, id: Uuid) -> RepoResult<Option<String>> {
        Ok(self.users.read().get(&id).map(|stored| stored.password_hash.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str, security_stamp: Uuid) -> RepoResult<()> {
        let mut users = self.users.write();
        let stored = users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;

        stored.password_hash = password_hash.to_string();
        stored.user.security_stamp = security_stamp;
        stored.user.updated_at = Utc::now();
        Ok(())
    }
}
