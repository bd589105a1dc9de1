//! Account data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ID type
pub type UserId = i64;

/// User account
///
/// The password digest never serializes; response payloads are built from
/// the other fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameters for inserting a new account row
///
/// `is_verified` and `is_superuser` are only ever true for seeded accounts;
/// self-registration starts with both unset.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_superuser: bool,
}

/// Self-registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// An access/refresh token pair issued for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stored refresh token row
///
/// Rows are revoked rather than deleted so a replayed token is
/// distinguishable from one that never existed.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: UserId,
    pub token: String,
    pub is_revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate account counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub verified: i64,
    pub superusers: i64,
}
