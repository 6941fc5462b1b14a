//! Authentication primitives

mod jwt;
mod password;
mod refresh;

pub use jwt::{AccessTokenIssuer, Claims, SignedToken, TokenError, TokenType};
pub use password::{hash_password, validate_password_strength, verify_against_dummy, verify_password};
pub use refresh::{generate_refresh_token, hash_refresh_token};
