//! Data transfer objects for API requests and responses
//!
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs (camelCase JSON)
//! - Mappers from domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LogoutRequest,
    RefreshTokenRequest, RegisterRequest, ResetPasswordLinkQuery, ResetPasswordRequest,
    UpdateProfileRequest,
};

pub use responses::{
    AuthResponse, HealthChecks, HealthResponse, MessageResponse, ReadinessResponse,
    SessionResponse, SessionsResponse, UserResponse,
};
