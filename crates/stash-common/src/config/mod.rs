//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, CleanupConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    JwtConfig, LinkConfig, RateLimitConfig, ServerConfig, StorageBackend,
};
