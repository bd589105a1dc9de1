//! Error translation from the account library to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use userbase::auth::AuthError;

/// Maps [`AuthError`] onto a status code and JSON error body
///
/// Conflicts and bad tokens are client errors; account-state refusals are
/// forbidden; missing subjects are not found. Infrastructure failures log
/// the detail and answer with a sanitized 500.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthError::EmailAlreadyExists
            | AuthError::UsernameAlreadyExists
            | AuthError::InvalidPassword
            | AuthError::InvalidToken
            | AuthError::ExpiredToken => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::AccountDeactivated | AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Database(_)
            | AuthError::StoreTimeout(_)
            | AuthError::Jwt(_)
            | AuthError::HashingFailed => {
                tracing::error!(error = %self.0, "Request failed with an internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({ "error": self.0.client_message() });
        (status, Json(body)).into_response()
    }
}
