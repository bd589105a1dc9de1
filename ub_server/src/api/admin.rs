//! Admin API handlers.
//!
//! All routes here sit behind the superuser middleware.

use axum::{
    Json,
    extract::{Path, State},
};
use userbase::auth::UserStats;

use super::{AppState, auth::UserResponse, error::ApiError};

/// Aggregate account statistics
pub async fn user_stats(State(state): State<AppState>) -> Result<Json<UserStats>, ApiError> {
    Ok(Json(state.admin.user_stats().await?))
}

/// Disable an account
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.admin.deactivate_user(user_id).await?.into()))
}

/// Re-enable a deactivated account
pub async fn reactivate_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.admin.reactivate_user(user_id).await?.into()))
}

/// Permanently remove an account, answering with its last snapshot
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.admin.delete_user(user_id).await?.into()))
}
