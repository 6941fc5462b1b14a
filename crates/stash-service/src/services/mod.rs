//! Business logic services
//!
//! Session management, profile and password reset use cases, plus the
//! refresh token ledger and background cleanup they share.

pub mod auth;
pub mod cleanup;
pub mod context;
mod credentials;
pub mod error;
pub mod ledger;
pub mod mailer;
pub mod password_reset;
pub mod profile;

pub use auth::AuthService;
pub use cleanup::{run_cleanup, spawn_cleanup_scheduler};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{AuthFailure, ServiceError, ServiceResult};
pub use ledger::{IssuedRefreshToken, RefreshTokenLedger};
pub use mailer::{LogMailer, Mailer, MailerError, MemoryMailer, PasswordResetEmail};
pub use password_reset::PasswordResetService;
pub use profile::ProfileService;
