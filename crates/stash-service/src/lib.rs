//! # stash-service
//!
//! Application layer: session management (login, token rotation, logout),
//! account and profile use cases, and the DTOs the HTTP layer speaks.

pub mod dto;
pub mod services;

pub use services::{
    AuthService, AuthFailure, LogMailer, Mailer, MemoryMailer, PasswordResetService,
    ProfileService, RefreshTokenLedger, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult,
};
