//! Domain entities - core business objects

mod refresh_token;
mod user;

pub use refresh_token::{RefreshToken, RefreshTokenState};
pub use user::{identifiers_match, User};
