//! Access token issuing and verification
//!
//! Tokens are HS512-signed JWTs carrying the user id and email, bound to the
//! configured issuer and audience. The same key also signs short-lived
//! password reset tokens, distinguished by their `token_type` claim.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stash_core::User;
use uuid::Uuid;

use crate::config::JwtConfig;

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    PasswordReset,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    pub token_type: TokenType,
    /// Security stamp of the user, only on password reset tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<String>,
}

impl Claims {
    /// Get the user ID from the subject
    ///
    /// # Errors
    /// Returns an error if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSubject)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Why a token was refused
///
/// Only ever logged. Callers collapse every variant except
/// [`TokenError::Encoding`] into one outward "unauthorized" answer.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be encoded: {0}")]
    Encoding(String),

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token algorithm is not accepted")]
    InvalidAlgorithm,

    #[error("token has expired")]
    Expired,

    #[error("token issuer does not match")]
    InvalidIssuer,

    #[error("token audience does not match")]
    InvalidAudience,

    #[error("required claim missing: {0}")]
    MissingClaim(String),

    #[error("token subject is not a user id")]
    InvalidSubject,

    #[error("token has the wrong type")]
    WrongType,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => Self::InvalidAlgorithm,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::MissingRequiredClaim(claim) => Self::MissingClaim(claim.clone()),
            ErrorKind::Json(_) => Self::MissingClaim("payload".to_string()),
            _ => Self::Malformed,
        }
    }
}

/// An encoded token together with its expiry
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies signed tokens
///
/// Holds only immutable key material loaded once at startup, so it is
/// shared freely behind an `Arc`.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_token_lifetime: Duration,
    password_reset_lifetime: Duration,
}

impl AccessTokenIssuer {
    /// Create an issuer from the JWT section of the configuration
    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_key.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_lifetime: config.access_token_lifetime(),
            password_reset_lifetime: config.password_reset_lifetime(),
        }
    }

    /// Lifetime of issued access tokens
    pub fn access_token_lifetime(&self) -> Duration {
        self.access_token_lifetime
    }

    /// Issue an access token for `user`, valid from now
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(&self, user: &User) -> Result<SignedToken, TokenError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue an access token as if minted at `issued_at`
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<SignedToken, TokenError> {
        self.sign(user, TokenType::Access, issued_at, self.access_token_lifetime, None)
    }

    /// Verify a bearer token: signature, issuer, audience, expiry and type
    ///
    /// # Errors
    /// Returns the reason the token was refused
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TokenType::Access, true)
    }

    /// Extract claims from an access token whose expiry may have passed
    ///
    /// Signature, algorithm, issuer and audience are still enforced; only
    /// the expiry check is skipped. Used solely by the refresh flow.
    ///
    /// # Errors
    /// Returns the reason the token was refused
    pub fn principal_from_expired_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TokenType::Access, false)
    }

    /// Issue a password reset token bound to the user's current security stamp
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_password_reset(&self, user: &User) -> Result<SignedToken, TokenError> {
        self.sign(
            user,
            TokenType::PasswordReset,
            Utc::now(),
            self.password_reset_lifetime,
            Some(user.security_stamp.to_string()),
        )
    }

    /// Verify a password reset token
    ///
    /// The caller must still compare the `stamp` claim with the user's
    /// current security stamp.
    ///
    /// # Errors
    /// Returns the reason the token was refused
    pub fn verify_password_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_typed(token, TokenType::PasswordReset, true)?;
        if claims.stamp.is_none() {
            return Err(TokenError::MissingClaim("stamp".to_string()));
        }
        Ok(claims)
    }

    fn sign(
        &self,
        user: &User,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
        stamp: Option<String>,
    ) -> Result<SignedToken, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .ok_or_else(|| TokenError::Encoding("token expiry is out of range".to_string()))?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            stamp,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        validation
    }

    fn decode_typed(&self, token: &str, expected: TokenType, validate_exp: bool) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation(validate_exp))?;
        let claims = data.claims;

        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }
        claims.user_id()?;

        Ok(claims)
    }
}

impl std::fmt::Debug for AccessTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_lifetime", &self.access_token_lifetime)
            .finish_non_exhaustive()
    }
}
