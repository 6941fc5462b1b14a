//! User model -> entity mapper

use stash_core::entities::User;

use crate::models::UserModel;

/// The password hash stays behind; it is only read through `get_password_hash`
impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: model.id,
            username: model.username,
            email: model.email,
            email_verified: model.email_verified,
            security_stamp: model.security_stamp,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
