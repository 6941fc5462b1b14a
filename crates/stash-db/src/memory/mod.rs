//! In-memory repositories
//!
//! Process-local implementations of the repository traits with the same
//! atomicity guarantees as the PostgreSQL ones. Used by the service tests
//! and by the `memory` storage backend.

mod refresh_token;
mod user;

pub use refresh_token::InMemoryRefreshTokenRepository;
pub use user::InMemoryUserRepository;
