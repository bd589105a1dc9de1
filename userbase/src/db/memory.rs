//! In-memory store implementing the repository traits.
//!
//! Backs tests and local experiments without a PostgreSQL instance. One
//! struct implements both repositories so deleting a user can cascade to
//! its refresh tokens the way the SQL schema does.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::auth::{AuthError, AuthResult, NewUser, RefreshToken, User, UserId, UserStats};

use super::repository::{RefreshTokenRepository, UserRepository};

#[derive(Default)]
struct MemoryInner {
    users: HashMap<UserId, User>,
    // Keyed by the opaque token string, the same lookup the SQL index serves.
    refresh_tokens: HashMap<String, RefreshToken>,
    next_user_id: UserId,
    next_token_id: i64,
}

/// Shared in-memory account store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> AuthResult<User> {
        let mut inner = self.inner.lock().await;

        // One lock spans the checks and the insert, so uniqueness here is
        // as authoritative as the SQL unique indexes.
        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }
        if inner.users.values().any(|u| u.username == new_user.username) {
            return Err(AuthError::UsernameAlreadyExists);
        }

        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            is_active: true,
            is_verified: new_user.is_verified,
            is_superuser: new_user.is_superuser,
            created_at: Utc::now(),
        };

        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn set_verified(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.is_verified = true;
            user.clone()
        }))
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> AuthResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.is_active = active;
            user.clone()
        }))
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> AuthResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.password_hash = password_hash.to_string();
            user.clone()
        }))
    }

    async fn delete_user(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let removed = inner.users.remove(&user_id);
        if removed.is_some() {
            inner.refresh_tokens.retain(|_, t| t.user_id != user_id);
        }
        Ok(removed)
    }

    async fn user_stats(&self) -> AuthResult<UserStats> {
        let inner = self.inner.lock().await;
        let users = inner.users.values();

        Ok(UserStats {
            total: inner.users.len() as i64,
            active: users.clone().filter(|u| u.is_active).count() as i64,
            verified: users.clone().filter(|u| u.is_verified).count() as i64,
            superusers: users.clone().filter(|u| u.is_superuser).count() as i64,
        })
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn create_refresh_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<RefreshToken> {
        let mut inner = self.inner.lock().await;

        inner.next_token_id += 1;
        let refresh_token = RefreshToken {
            id: inner.next_token_id,
            user_id,
            token: token.to_string(),
            is_revoked: false,
            expires_at,
            created_at: Utc::now(),
        };

        inner
            .refresh_tokens
            .insert(token.to_string(), refresh_token.clone());
        Ok(refresh_token)
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let inner = self.inner.lock().await;
        Ok(inner.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token_id: i64) -> AuthResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner
            .refresh_tokens
            .values_mut()
            .find(|t| t.id == token_id)
        {
            row.is_revoked = true;
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: UserId) -> AuthResult<u64> {
        let mut inner = self.inner.lock().await;
        let mut revoked = 0;

        for row in inner.refresh_tokens.values_mut() {
            if row.user_id == user_id && !row.is_revoked {
                row.is_revoked = true;
                revoked += 1;
            }
        }

        Ok(revoked)
    }
}
