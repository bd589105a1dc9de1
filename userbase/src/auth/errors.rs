//! Account error types.

use std::time::Duration;

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

use super::tokens::TokenError;

/// Account and authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store operation exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Token signing failed
    #[error("Token signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Email already registered
    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Username already taken
    #[error("Username already taken")]
    UsernameAlreadyExists,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Password verification failed
    #[error("Invalid password")]
    InvalidPassword,

    /// Account is deactivated
    #[error("Account is deactivated")]
    AccountDeactivated,

    /// Email address has not been verified
    #[error("Email not verified")]
    EmailNotVerified,

    /// Malformed, unknown, revoked, or wrong-purpose token
    #[error("Invalid token")]
    InvalidToken,

    /// Genuine token past its expiry
    #[error("Token expired")]
    ExpiredToken,

    /// Caller lacks valid credentials for this operation
    #[error("Unauthorized")]
    Unauthorized,
}

impl AuthError {
    /// Message safe to show to clients
    ///
    /// Infrastructure failures carry connection strings and signing
    /// internals in their display form, so they collapse to a generic
    /// message at the boundary.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::StoreTimeout(_) => {
                "Internal server error".to_string()
            }
            AuthError::Jwt(_) | AuthError::HashingFailed => "Authentication failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Malformed | TokenError::TypeMismatch => AuthError::InvalidToken,
        }
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => AuthError::StoreTimeout(duration),
            TimeoutError::Database(err) => AuthError::Database(err),
        }
    }
}

/// Result type for account operations
pub type AuthResult<T> = Result<T, AuthError>;
