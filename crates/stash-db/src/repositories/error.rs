//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use stash_core::error::DomainError;
use uuid::Uuid;

const USERNAME_UNIQUE_INDEX: &str = "users_username_lower_key";

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Map a unique violation on `users` to the field that clashed
pub fn user_conflict(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(USERNAME_UNIQUE_INDEX) => DomainError::UsernameAlreadyExists,
        _ => DomainError::EmailAlreadyExists,
    }
}

/// Create a "user not found" error
pub fn user_not_found(id: Uuid) -> DomainError {
    DomainError::UserNotFound(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_conflict_by_constraint() {
        assert!(matches!(
            user_conflict(Some(USERNAME_UNIQUE_INDEX)),
            DomainError::UsernameAlreadyExists
        ));
        assert!(matches!(
            user_conflict(Some("users_email_lower_key")),
            DomainError::EmailAlreadyExists
        ));
    }

    #[test]
    fn test_non_database_error_is_wrapped() {
        let err = map_unique_violation(SqlxError::RowNotFound, |_| DomainError::RefreshTokenExists);
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
