//! Authentication and authorization middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use userbase::auth::{AuthError, User};

use super::{AppState, error::ApiError};

/// Validate the bearer access token and inject the caller's [`User`] into
/// the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(AuthError::Unauthorized))?;

    let user = state.accounts.current_user(token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Reject callers whose account lacks the superuser flag
///
/// Must run inside `auth_middleware`, which puts the caller's user into
/// the request extensions. Non-superusers get the same answer as missing
/// credentials, so the gate reveals nothing about the route.
pub async fn superuser_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_superuser = request
        .extensions()
        .get::<User>()
        .is_some_and(|user| user.is_superuser);

    if !is_superuser {
        return Err(ApiError(AuthError::Unauthorized));
    }

    Ok(next.run(request).await)
}
