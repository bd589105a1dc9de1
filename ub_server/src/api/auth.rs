//! Authentication API handlers.

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use userbase::auth::{AuthError, RegisterRequest, User};

use super::{AppState, error::ApiError};
use crate::{logging, metrics};

// ============================================================================
// Request / Response Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Public account representation
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_superuser: user.is_superuser,
        }
    }
}

/// Login accepts either an email address or a username in `login`.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailPayload {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordPayload {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordPayload {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .accounts
        .register(RegisterRequest {
            email: payload.email,
            username: payload.username,
            password: payload.password,
        })
        .await?;

    metrics::registrations_total();

    Ok(Json(user.into()))
}

/// Log in with email or username plus password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    match state.accounts.login(&payload.login, &payload.password).await {
        Ok((user, tokens)) => {
            metrics::login_attempts_total(true);

            Ok(Json(LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                token_type: "bearer",
                user_id: user.id,
            }))
        }
        Err(err) => {
            metrics::login_attempts_total(false);
            logging::log_security_event("failed_login", None, &err.to_string());

            Err(err.into())
        }
    }
}

/// Confirm an email address from an emailed verification token
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.accounts.verify_email_token(&payload.token).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully",
    }))
}

/// Resend the verification email for the authenticated user
pub async fn request_verification(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.accounts.request_email_verification(&user)?;

    Ok(Json(MessageResponse {
        message: "Verification email sent",
    }))
}

/// Revoke every refresh token the authenticated user holds
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.accounts.logout(user.id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}

/// Start a password reset
///
/// Answers identically whether or not the address has a usable account,
/// so the endpoint cannot be used to probe for registered emails. The
/// real outcome is logged server-side. Infrastructure failures still
/// surface as errors.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.accounts.forgot_password(&payload.email).await {
        Ok(()) => {}
        Err(
            err @ (AuthError::UserNotFound
            | AuthError::AccountDeactivated
            | AuthError::EmailNotVerified),
        ) => {
            tracing::info!(error = %err, "Password reset request suppressed");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Json(MessageResponse {
        message: "If the account exists, a password reset email has been sent",
    }))
}

/// Complete a password reset from an emailed reset token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully",
    }))
}

/// Rotate a refresh token into a fresh session pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let tokens = state
        .accounts
        .rotate_refresh_token(&payload.refresh_token)
        .await?;

    Ok(Json(RefreshResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "bearer",
    }))
}
