//! Account manager implementation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::db::{RefreshTokenRepository, UserRepository};
use crate::mail::{AccountEmail, Mailer};

use super::errors::{AuthError, AuthResult};
use super::models::{NewUser, RegisterRequest, SessionTokens, User, UserId};
use super::password;
use super::tokens::{TokenClaims, TokenCodec, TokenKind};

/// Policy and environment settings for the account manager
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Server-side pepper appended to passwords before hashing
    pub pepper: String,
    /// External base URL used to build emailed links
    pub public_url: String,
    /// Whether login requires a verified email address
    pub require_verified_login: bool,
    /// Lifetime of issued refresh tokens
    pub refresh_token_ttl: Duration,
}

impl AccountConfig {
    /// Config with the given pepper and default policy: links built
    /// against localhost, verified email required to log in, and
    /// 30 day refresh tokens
    pub fn new(pepper: impl Into<String>) -> Self {
        Self {
            pepper: pepper.into(),
            public_url: "http://localhost:8000".to_string(),
            require_verified_login: true,
            refresh_token_ttl: Duration::days(30),
        }
    }
}

/// Account manager
///
/// Orchestrates registration, authentication, session token issuance and
/// rotation, email verification, and password reset over the store and
/// the mailer.
#[derive(Clone)]
pub struct AccountManager {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    tokens: TokenCodec,
    mailer: Mailer,
    config: AccountConfig,
}

impl AccountManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        tokens: TokenCodec,
        mailer: Mailer,
        config: AccountConfig,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            tokens,
            mailer,
            config,
        }
    }

    /// Register a new user account
    ///
    /// The account starts active, unverified, and without superuser
    /// rights. A verification email is scheduled once the row is stored.
    ///
    /// # Arguments
    ///
    /// * `request` - Email, username, and plain password
    ///
    /// # Returns
    ///
    /// * `AuthResult<User>` - The created user or an error
    ///
    /// # Errors
    ///
    /// * `AuthError::EmailAlreadyExists` - Email already registered
    /// * `AuthError::UsernameAlreadyExists` - Username already taken
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        // Advisory pre-checks, email first. The store's unique indexes
        // stay authoritative when two registrations race past these reads.
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameAlreadyExists);
        }

        let password_hash = password::hash_password(&request.password, &self.config.pepper)?;

        let user = self
            .users
            .create_user(NewUser {
                email: request.email,
                username: request.username,
                password_hash,
                is_verified: false,
                is_superuser: false,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        // Mail only after the row is stored; a failed insert must not
        // produce a verification email.
        self.request_email_verification(&user)?;

        Ok(user)
    }

    /// Issue a verification token and schedule the verification email
    ///
    /// Used at registration and by the resend endpoint.
    pub fn request_email_verification(&self, user: &User) -> AuthResult<()> {
        let token = self
            .tokens
            .issue(user.id, TokenKind::EmailVerification, Some(&user.username))?;

        self.mailer.send(AccountEmail::Verification {
            to: user.email.clone(),
            username: user.username.clone(),
            link: format!(
                "{}/verification-process?token={}",
                self.config.public_url, token
            ),
        });

        Ok(())
    }

    /// Authenticate by email or username plus password
    ///
    /// Checks run in order: existence, active, verified (when the policy
    /// requires it), then password, so account-state errors take
    /// precedence over credential errors for existing accounts.
    ///
    /// # Arguments
    ///
    /// * `login` - Email address or username
    /// * `password` - Plain password
    ///
    /// # Returns
    ///
    /// * `AuthResult<User>` - The authenticated user or an error
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account matches the login
    /// * `AuthError::AccountDeactivated` - Account is disabled
    /// * `AuthError::EmailNotVerified` - Verification required but missing
    /// * `AuthError::InvalidPassword` - Password mismatch
    pub async fn authenticate(&self, login: &str, password: &str) -> AuthResult<User> {
        // Logins containing '@' are email addresses; usernames cannot
        // contain '@'.
        let user = if login.contains('@') {
            self.users.find_by_email(login).await?
        } else {
            self.users.find_by_username(login).await?
        }
        .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if self.config.require_verified_login && !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        if !password::verify_password(password, &self.config.pepper, &user.password_hash) {
            return Err(AuthError::InvalidPassword);
        }

        Ok(user)
    }

    /// Authenticate and issue a fresh session token pair
    pub async fn login(&self, login: &str, password: &str) -> AuthResult<(User, SessionTokens)> {
        let user = self.authenticate(login, password).await?;
        let tokens = self.issue_session_tokens(&user).await?;

        tracing::info!(user_id = user.id, username = %user.username, "User logged in");

        Ok((user, tokens))
    }

    /// Issue an access/refresh token pair for an authenticated user
    ///
    /// The access token is a signed stateless credential; the refresh
    /// token is an opaque random string stored for later rotation or
    /// revocation.
    pub async fn issue_session_tokens(&self, user: &User) -> AuthResult<SessionTokens> {
        let access_token = self
            .tokens
            .issue(user.id, TokenKind::Access, Some(&user.username))?;

        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.config.refresh_token_ttl;
        self.refresh_tokens
            .create_refresh_token(user.id, &refresh_token, expires_at)
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Rotate a refresh token, revoking it and issuing a fresh pair
    ///
    /// Rotation is single-use: the presented token is revoked before new
    /// tokens are issued, so replaying it fails. Account state is not
    /// re-checked here; deactivation takes effect when the access token
    /// expires or on logout.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - Unknown, revoked, or orphaned token
    /// * `AuthError::ExpiredToken` - Token past its expiry
    pub async fn rotate_refresh_token(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let stored = self
            .refresh_tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if stored.expires_at < Utc::now() {
            return Err(AuthError::ExpiredToken);
        }

        if stored.is_revoked {
            tracing::warn!(user_id = stored.user_id, "Replay of a revoked refresh token");
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .users
            .find_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.refresh_tokens.revoke_refresh_token(stored.id).await?;

        self.issue_session_tokens(&user).await
    }

    /// Revoke every outstanding refresh token for the user
    ///
    /// # Returns
    ///
    /// * `AuthResult<u64>` - Number of sessions revoked
    pub async fn logout(&self, user_id: UserId) -> AuthResult<u64> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;

        tracing::info!(user_id, revoked, "User logged out");

        Ok(revoked)
    }

    /// Confirm an email address from a verification token
    ///
    /// Verifying an already-verified account succeeds, so a link can be
    /// clicked twice. A confirmation email is scheduled once the flag is
    /// stored.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - Malformed or wrong-purpose token
    /// * `AuthError::ExpiredToken` - Token past its expiry
    /// * `AuthError::UserNotFound` - Subject no longer resolves
    pub async fn verify_email_token(&self, token: &str) -> AuthResult<User> {
        let claims = self.tokens.verify(token, TokenKind::EmailVerification)?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .set_verified(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = user.id, "Email verified");

        self.mailer.send(AccountEmail::VerificationConfirmed {
            to: user.email.clone(),
            username: user.username.clone(),
        });

        Ok(user)
    }

    /// Start the password reset flow for an email address
    ///
    /// Preconditions mirror authentication's account-state checks. The
    /// HTTP boundary collapses these errors into a uniform acknowledgment
    /// so callers cannot probe which addresses exist; library consumers
    /// get the full detail.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account for this email
    /// * `AuthError::AccountDeactivated` - Account is disabled
    /// * `AuthError::EmailNotVerified` - Address never verified
    pub async fn forgot_password(&self, email: &str) -> AuthResult<()> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let token = self
            .tokens
            .issue(user.id, TokenKind::PasswordReset, Some(&user.username))?;

        self.mailer.send(AccountEmail::PasswordReset {
            to: user.email.clone(),
            username: user.username.clone(),
            link: format!("{}/reset-process?token={}", self.config.public_url, token),
        });

        Ok(())
    }

    /// Complete a password reset from a reset token
    ///
    /// Stores the new digest and revokes every outstanding refresh token,
    /// so sessions established before the reset cannot be rotated
    /// further. A confirmation email is scheduled once the digest is
    /// stored.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - Malformed or wrong-purpose token
    /// * `AuthError::ExpiredToken` - Token past its expiry
    /// * `AuthError::UserNotFound` - Subject no longer resolves
    /// * `AuthError::AccountDeactivated` - Account is disabled
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<User> {
        let claims = self.tokens.verify(token, TokenKind::PasswordReset)?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        let password_hash = password::hash_password(new_password, &self.config.pepper)?;
        let user = self
            .users
            .update_password_hash(user.id, &password_hash)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.refresh_tokens.revoke_all_for_user(user.id).await?;

        tracing::info!(user_id = user.id, "Password reset completed");

        self.mailer.send(AccountEmail::PasswordResetConfirmed {
            to: user.email.clone(),
            username: user.username.clone(),
        });

        Ok(user)
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> AuthResult<TokenClaims> {
        Ok(self.tokens.verify(token, TokenKind::Access)?)
    }

    /// Resolve the user behind a bearer access token
    ///
    /// Every failure mode (bad signature, wrong purpose, unparseable
    /// subject, or a subject that no longer exists) collapses to
    /// `Unauthorized`, so the boundary leaks nothing about why a
    /// credential was rejected.
    pub async fn current_user(&self, token: &str) -> AuthResult<User> {
        let claims = self
            .tokens
            .verify(token, TokenKind::Access)
            .map_err(|_| AuthError::Unauthorized)?;

        let user_id = claims.user_id().map_err(|_| AuthError::Unauthorized)?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}
