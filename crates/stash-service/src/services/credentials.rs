//! Argon2 work moved off the async executor

use stash_common::{hash_password, verify_against_dummy, verify_password};
use tokio::task;

use super::error::{ServiceError, ServiceResult};

pub(crate) async fn hash(password: String) -> ServiceResult<String> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::internal(format!("password hashing task failed: {e}")))?
        .map_err(ServiceError::from)
}

pub(crate) async fn verify(password: String, hash: String) -> ServiceResult<bool> {
    task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::internal(format!("password verification task failed: {e}")))?
        .map_err(ServiceError::from)
}

/// Verify against a throwaway hash so a missing account costs the same time
pub(crate) async fn verify_dummy(password: String) {
    let _ = task::spawn_blocking(move || verify_against_dummy(&password)).await;
}
