//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).
//! The resulting [`AppConfig`] is built once at startup and shared immutably.

use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;

/// Shortest signing key accepted for HS512
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 24 * 60;

/// Longest accepted refresh token lifetime
pub const MAX_REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 365;

/// Longest accepted password reset link lifetime (one day)
pub const MAX_PASSWORD_RESET_EXPIRATION_MINUTES: i64 = 24 * 60;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub storage: StorageBackend,
    /// Present whenever `storage` is [`StorageBackend::Postgres`]
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub links: LinkConfig,
    pub cleanup: CleanupConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where users and refresh tokens live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local maps; state is lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Database configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish_non_exhaustive()
    }
}

/// Token signing and lifetime configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub signing_key: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiration_minutes: i64,
    pub refresh_token_expiration_days: i64,
    pub password_reset_expiration_minutes: i64,
}

impl JwtConfig {
    /// Access token lifetime; saturates instead of panicking on out of range values
    #[must_use]
    pub fn access_token_lifetime(&self) -> TimeDelta {
        TimeDelta::try_minutes(self.access_token_expiration_minutes).unwrap_or(TimeDelta::MAX)
    }

    /// Refresh token lifetime; saturates instead of panicking on out of range values
    #[must_use]
    pub fn refresh_token_lifetime(&self) -> TimeDelta {
        TimeDelta::try_days(self.refresh_token_expiration_days).unwrap_or(TimeDelta::MAX)
    }

    /// Password reset token lifetime; saturates instead of panicking on out of range values
    #[must_use]
    pub fn password_reset_lifetime(&self) -> TimeDelta {
        TimeDelta::try_minutes(self.password_reset_expiration_minutes).unwrap_or(TimeDelta::MAX)
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("signing_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_expiration_minutes", &self.access_token_expiration_minutes)
            .field("refresh_token_expiration_days", &self.refresh_token_expiration_days)
            .field("password_reset_expiration_minutes", &self.password_reset_expiration_minutes)
            .finish()
    }
}

/// Externally visible base URLs used when building links
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Base URL of this API, used in password reset emails
    pub public_url: String,
    /// Base URL of the web client the reset link redirects to
    pub frontend_url: String,
}

/// Background refresh token reaping
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval_secs: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "stash".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_access_token_expiration_minutes() -> i64 {
    15
}

fn default_refresh_token_expiration_days() -> i64 {
    7
}

fn default_password_reset_expiration_minutes() -> i64 {
    30
}

fn default_public_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns an error if required variables are missing or invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let storage = vars.parse_or("STORAGE_BACKEND", StorageBackend::default)?;
        let database = match storage {
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: vars.parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            }),
            StorageBackend::Memory => None,
        };

        let signing_key = vars.required("JWT_SIGNING_KEY")?;
        if signing_key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::InvalidValue(
                "JWT_SIGNING_KEY",
                format!("must be at least {MIN_SIGNING_KEY_BYTES} bytes"),
            ));
        }

        let jwt = JwtConfig {
            signing_key,
            issuer: vars.required("JWT_ISSUER")?,
            audience: vars.required("JWT_AUDIENCE")?,
            access_token_expiration_minutes: vars.bounded_or(
                "JWT_ACCESS_TOKEN_EXPIRATION_MINUTES",
                default_access_token_expiration_minutes,
                MAX_ACCESS_TOKEN_EXPIRATION_MINUTES,
            )?,
            refresh_token_expiration_days: vars.bounded_or(
                "JWT_REFRESH_TOKEN_EXPIRATION_DAYS",
                default_refresh_token_expiration_days,
                MAX_REFRESH_TOKEN_EXPIRATION_DAYS,
            )?,
            password_reset_expiration_minutes: vars.bounded_or(
                "PASSWORD_RESET_EXPIRATION_MINUTES",
                default_password_reset_expiration_minutes,
                MAX_PASSWORD_RESET_EXPIRATION_MINUTES,
            )?,
        };

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.parse_or("APP_ENV", Environment::default)?,
            },
            api: ServerConfig {
                host: vars.get("API_HOST").unwrap_or_else(default_host),
                port: vars
                    .get("API_PORT")
                    .ok_or(ConfigError::MissingVar("API_PORT"))
                    .and_then(|s| s.parse().map_err(|_| ConfigError::InvalidValue("API_PORT", s)))?,
            },
            storage,
            database,
            jwt,
            links: LinkConfig {
                public_url: vars.get("PUBLIC_URL").unwrap_or_else(default_public_url),
                frontend_url: vars.get("FRONTEND_URL").unwrap_or_else(default_frontend_url),
            },
            cleanup: CleanupConfig {
                interval_secs: vars.parse_or("TOKEN_CLEANUP_INTERVAL_SECS", default_cleanup_interval_secs)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: vars.parse_or("RATE_LIMIT_REQUESTS_PER_SECOND", default_requests_per_second)?,
                burst: vars.parse_or("RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: vars
                    .get("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(default()),
        }
    }

    fn bounded_or(&self, key: &'static str, default: fn() -> i64, max: i64) -> Result<i64, ConfigError> {
        let value = self.parse_or(key, default)?;
        if !(1..=max).contains(&value) {
            return Err(ConfigError::InvalidValue(key, format!("{value} (expected 1..={max})")));
        }
        Ok(value)
    }
}

/// Configuration errors
///
/// All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
