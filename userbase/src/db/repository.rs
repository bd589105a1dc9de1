//! Repository traits over the account store with PostgreSQL
//! implementations.
//!
//! Services depend on the traits, so production runs against PostgreSQL
//! while tests run against the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, NewUser, RefreshToken, User, UserId, UserStats};

use super::timeouts::{TimeoutError, with_default_timeout};

/// User account repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user row
    ///
    /// Fails with [`AuthError::EmailAlreadyExists`] or
    /// [`AuthError::UsernameAlreadyExists`] when the row collides with an
    /// existing account.
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Mark a user's email as verified, returning the updated row
    async fn set_verified(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Set a user's active flag, returning the updated row
    async fn set_active(&self, user_id: UserId, active: bool) -> AuthResult<Option<User>>;

    /// Replace a user's password digest, returning the updated row
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> AuthResult<Option<User>>;

    /// Remove a user row entirely, returning the removed row
    ///
    /// The user's refresh tokens are removed with it.
    async fn delete_user(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Aggregate account counts
    async fn user_stats(&self) -> AuthResult<UserStats>;
}

/// Refresh token repository operations
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert a refresh token row
    async fn create_refresh_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<RefreshToken>;

    /// Find a refresh token row by its opaque token string
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Mark a single refresh token as revoked
    async fn revoke_refresh_token(&self, token_id: i64) -> AuthResult<()>;

    /// Mark every refresh token belonging to a user as revoked, returning
    /// how many rows changed
    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<u64>;
}

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_verified: row.get("is_verified"),
        is_superuser: row.get("is_superuser"),
        created_at: row.get("created_at"),
    }
}

/// Map a unique index violation onto the conflict it represents
///
/// The service's pre-insert checks are advisory; the unique indexes on
/// email and username stay authoritative when two registrations race past
/// those reads.
fn translate_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            match db_err.constraint() {
                Some(name) if name.contains("email") => return AuthError::EmailAlreadyExists,
                Some(name) if name.contains("username") => {
                    return AuthError::UsernameAlreadyExists;
                }
                _ => {}
            }
        }
    }

    AuthError::Database(err)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO users (email, username, password_hash, is_verified, is_superuser)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, email, username, password_hash,
                          is_active, is_verified, is_superuser, created_at
                "#,
            )
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .bind(new_user.is_verified)
            .bind(new_user.is_superuser)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(map_user(&row)),
            Err(TimeoutError::Database(err)) => Err(translate_unique_violation(err)),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, email, username, password_hash,
                       is_active, is_verified, is_superuser, created_at
                FROM users WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, email, username, password_hash,
                       is_active, is_verified, is_superuser, created_at
                FROM users WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, email, username, password_hash,
                       is_active, is_verified, is_superuser, created_at
                FROM users WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn set_verified(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE users SET is_verified = TRUE
                WHERE id = $1
                RETURNING id, email, username, password_hash,
                          is_active, is_verified, is_superuser, created_at
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE users SET is_active = $2
                WHERE id = $1
                RETURNING id, email, username, password_hash,
                          is_active, is_verified, is_superuser, created_at
                "#,
            )
            .bind(user_id)
            .bind(active)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE users SET password_hash = $2
                WHERE id = $1
                RETURNING id, email, username, password_hash,
                          is_active, is_verified, is_superuser, created_at
                "#,
            )
            .bind(user_id)
            .bind(password_hash)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn delete_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        // Refresh tokens go with the row via ON DELETE CASCADE.
        let row = with_default_timeout(
            sqlx::query(
                r#"
                DELETE FROM users
                WHERE id = $1
                RETURNING id, email, username, password_hash,
                          is_active, is_verified, is_superuser, created_at
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn user_stats(&self) -> AuthResult<UserStats> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT COUNT(*) AS total,
                       COUNT(*) FILTER (WHERE is_active) AS active,
                       COUNT(*) FILTER (WHERE is_verified) AS verified,
                       COUNT(*) FILTER (WHERE is_superuser) AS superusers
                FROM users
                "#,
            )
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(UserStats {
            total: row.get("total"),
            active: row.get("active"),
            verified: row.get("verified"),
            superusers: row.get("superusers"),
        })
    }
}

/// PostgreSQL implementation of RefreshTokenRepository
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_refresh_token(row: &PgRow) -> RefreshToken {
    RefreshToken {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token: row.get("token"),
        is_revoked: row.get("is_revoked"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn create_refresh_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<RefreshToken> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (user_id, token, expires_at)
                VALUES ($1, $2, $3)
                RETURNING id, user_id, token, is_revoked, expires_at, created_at
                "#,
            )
            .bind(user_id)
            .bind(token)
            .bind(expires_at)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(map_refresh_token(&row))
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, user_id, token, is_revoked, expires_at, created_at
                FROM refresh_tokens WHERE token = $1
                "#,
            )
            .bind(token)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(map_refresh_token))
    }

    async fn revoke_refresh_token(&self, token_id: i64) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE WHERE id = $1")
                .bind(token_id)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<u64> {
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE refresh_tokens SET is_revoked = TRUE WHERE user_id = $1 AND NOT is_revoked",
            )
            .bind(user_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }
}
