//! User profile handlers.

use axum::{Extension, Json};
use serde::Serialize;
use userbase::auth::User;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// The authenticated user's own profile
pub async fn me(Extension(user): Extension<User>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: user.id,
        email: user.email,
        username: user.username,
    })
}
