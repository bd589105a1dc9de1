//! Admin manager implementation.

use std::sync::Arc;

use crate::auth::{AuthError, AuthResult, User, UserId, UserStats};
use crate::db::UserRepository;

/// Admin manager
///
/// Account administration for operators: aggregate statistics, the
/// reversible active toggle, and permanent deletion.
#[derive(Clone)]
pub struct AdminManager {
    users: Arc<dyn UserRepository>,
}

impl AdminManager {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Aggregate account counts
    pub async fn user_stats(&self) -> AuthResult<UserStats> {
        self.users.user_stats().await
    }

    /// Disable an account, blocking authentication until reactivated
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account with this id
    pub async fn deactivate_user(&self, user_id: UserId) -> AuthResult<User> {
        let user = self
            .users
            .set_active(user_id, false)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id, "User deactivated");

        Ok(user)
    }

    /// Re-enable a deactivated account
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account with this id
    pub async fn reactivate_user(&self, user_id: UserId) -> AuthResult<User> {
        let user = self
            .users
            .set_active(user_id, true)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id, "User reactivated");

        Ok(user)
    }

    /// Permanently remove an account
    ///
    /// Unlike deactivation this is not reversible: the row is removed and
    /// the user's refresh tokens go with it. Returns a snapshot of the
    /// removed user.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No account with this id
    pub async fn delete_user(&self, user_id: UserId) -> AuthResult<User> {
        let user = self
            .users
            .delete_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::warn!(user_id, username = %user.username, "User deleted");

        Ok(user)
    }
}
