//! Stateless signed tokens for access, email verification, and password
//! reset.
//!
//! Refresh tokens are deliberately not minted here: they are opaque,
//! store-backed strings so each one can be revoked and rotated
//! individually.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::UserId;

/// What a signed token is good for. Carried in the `type` claim so a token
/// issued for one purpose cannot be replayed for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "email_verification")]
    EmailVerification,
    #[serde(rename = "password_reset")]
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::EmailVerification => "email_verification",
            TokenKind::PasswordReset => "password_reset",
        }
    }
}

/// Claims carried by every signed token
///
/// `sub` is the user id serialized as a string, the interoperable form for
/// JWT subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl TokenClaims {
    /// Parse the subject claim back into a user id
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}

/// Token verification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature checks out but the expiry is in the past
    #[error("Token expired")]
    Expired,

    /// Signature invalid, claims unreadable, or subject unparseable
    #[error("Invalid token")]
    Malformed,

    /// Genuine token presented for the wrong purpose
    #[error("Unexpected token type")]
    TypeMismatch,
}

/// Signing configuration for the token codec
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: String,
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of email verification tokens
    pub verification_ttl: Duration,
    /// Lifetime of password reset tokens
    pub reset_ttl: Duration,
}

impl TokenConfig {
    /// Config with default lifetimes: 1 hour access tokens, 5 minute
    /// verification and reset tokens
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::seconds(3600),
            verification_ttl: Duration::seconds(300),
            reset_ttl: Duration::seconds(300),
        }
    }
}

/// Encodes and verifies signed stateless tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
    verification_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        // Expiry is compared manually in verify so there is no clock
        // leeway: a token minted with a zero lifetime is already expired.
        let mut validation = Validation::default();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            header: Header::default(),
            validation,
            access_ttl: config.access_ttl,
            verification_ttl: config.verification_ttl,
            reset_ttl: config.reset_ttl,
        }
    }

    /// Lifetime applied to tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::EmailVerification => self.verification_ttl,
            TokenKind::PasswordReset => self.reset_ttl,
        }
    }

    /// Issue a signed token of `kind` for `user_id` with the configured
    /// lifetime
    pub fn issue(
        &self,
        user_id: UserId,
        kind: TokenKind,
        username: Option<&str>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_ttl(user_id, kind, username, self.ttl(kind))
    }

    /// Issue a signed token with an explicit lifetime
    pub fn issue_with_ttl(
        &self,
        user_id: UserId,
        kind: TokenKind,
        username: Option<&str>,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            kind,
            username: username.map(str::to_string),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&self.header, &claims, &self.encoding)
    }

    /// Verify a token's signature and expiry, then check its purpose
    ///
    /// Checks run in that order, so callers can tell a stale-but-genuine
    /// token apart from a forged or misused one.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Malformed)?;

        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        if data.claims.kind != expected {
            return Err(TokenError::TypeMismatch);
        }

        Ok(data.claims)
    }
}
