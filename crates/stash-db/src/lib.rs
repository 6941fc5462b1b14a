//! # stash-db
//!
//! Storage layer implementing the `stash-core` repository traits.
//!
//! ## Overview
//!
//! - Connection pool management and schema bootstrap for PostgreSQL
//! - Database models with SQLx `FromRow` derives and entity mappers
//! - PostgreSQL repositories
//! - In-memory repositories for tests and single-process deployments
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stash_db::{create_pool, bootstrap_schema, PgUserRepository};
//!
//! async fn example(config: &stash_common::DatabaseConfig) -> Result<(), sqlx::Error> {
//!     let pool = create_pool(config).await?;
//!     bootstrap_schema(&pool).await?;
//!     let user_repo = PgUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
pub use pool::{bootstrap_schema, create_pool, ping, PgPool};
pub use repositories::{PgRefreshTokenRepository, PgUserRepository};
