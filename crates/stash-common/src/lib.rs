//! # stash-common
//!
//! Shared utilities including configuration, error handling, authentication primitives, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    generate_refresh_token, hash_password, hash_refresh_token, validate_password_strength,
    verify_against_dummy, verify_password, AccessTokenIssuer, Claims, SignedToken, TokenError,
    TokenType,
};
pub use config::{
    AppConfig, AppSettings, CleanupConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    JwtConfig, LinkConfig, RateLimitConfig, ServerConfig, StorageBackend,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{try_init_tracing_with_config, TracingConfig, TracingError};
