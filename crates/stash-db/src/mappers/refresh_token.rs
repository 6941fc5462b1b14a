//! Refresh token model -> entity mapper

use stash_core::entities::RefreshToken;

use crate::models::RefreshTokenModel;

impl From<RefreshTokenModel> for RefreshToken {
    fn from(model: RefreshTokenModel) -> Self {
        RefreshToken {
            id: model.id,
            user_id: model.user_id,
            token_hash: model.token_hash,
            created_at: model.created_at,
            expires_at: model.expires_at,
            is_used: model.is_used,
            is_revoked: model.is_revoked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_model_to_entity() {
        let now = Utc::now();
        let model = RefreshTokenModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "abc".to_string(),
            created_at: now,
            expires_at: now + Duration::days(7),
            is_used: true,
            is_revoked: false,
        };

        let token = RefreshToken::from(model.clone());
        assert_eq!(token.id, model.id);
        assert_eq!(token.user_id, model.user_id);
        assert!(token.is_used);
        assert!(!token.is_valid_at(now));
    }
}
