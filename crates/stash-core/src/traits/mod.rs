//! Repository traits (ports)

mod repositories;

pub use repositories::{RedeemOutcome, RefreshTokenRepository, RepoResult, UserRepository};
