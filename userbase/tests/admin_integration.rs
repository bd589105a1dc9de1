//! Integration tests for administrative account operations.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use userbase::admin::AdminManager;
use userbase::auth::{
    AccountConfig, AccountManager, AuthError, NewUser, RegisterRequest, TokenCodec, TokenConfig,
    User, UserStats,
};
use userbase::db::{MemoryStore, UserRepository};
use userbase::mail::{AccountEmail, Mailer};

const TEST_SECRET: &str = "test_jwt_secret_of_32_characters!!";
const TEST_PEPPER: &str = "test_pepper_16ch";

struct TestHarness {
    accounts: AccountManager,
    admin: AdminManager,
    store: Arc<MemoryStore>,
    outbox: UnboundedReceiver<AccountEmail>,
}

fn harness() -> TestHarness {
    let store = Arc::new(MemoryStore::new());
    let (mailer, outbox) = Mailer::channel();
    let accounts = AccountManager::new(
        store.clone(),
        store.clone(),
        TokenCodec::new(&TokenConfig::new(TEST_SECRET)),
        mailer,
        AccountConfig::new(TEST_PEPPER),
    );
    let admin = AdminManager::new(store.clone());

    TestHarness {
        accounts,
        admin,
        store,
        outbox,
    }
}

/// Register a user and complete email verification.
async fn register_verified(h: &mut TestHarness, email: &str, username: &str) -> User {
    h.accounts
        .register(RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "SecurePass123".to_string(),
        })
        .await
        .unwrap();

    let sent = h.outbox.recv().await.unwrap();
    let AccountEmail::Verification { link, .. } = sent else {
        panic!("expected a verification email");
    };
    let token = link.split("token=").nth(1).unwrap();

    let user = h.accounts.verify_email_token(token).await.unwrap();
    let _ = h.outbox.recv().await; // confirmation email
    user
}

#[tokio::test]
async fn test_user_stats_reflect_account_states() {
    let mut h = harness();

    register_verified(&mut h, "alice@example.com", "alice").await;
    let bob = register_verified(&mut h, "bob@example.com", "bob").await;
    h.accounts
        .register(RegisterRequest {
            email: "carol@example.com".to_string(),
            username: "carol".to_string(),
            password: "SecurePass123".to_string(),
        })
        .await
        .unwrap();
    h.store
        .create_user(NewUser {
            email: "root@example.com".to_string(),
            username: "root".to_string(),
            password_hash: "digest".to_string(),
            is_verified: true,
            is_superuser: true,
        })
        .await
        .unwrap();

    h.admin.deactivate_user(bob.id).await.unwrap();

    let stats = h.admin.user_stats().await.unwrap();
    assert_eq!(
        stats,
        UserStats {
            total: 4,
            active: 3,
            verified: 3,
            superusers: 1,
        }
    );
}

#[tokio::test]
async fn test_deactivate_blocks_login_until_reactivated() {
    let mut h = harness();
    let user = register_verified(&mut h, "alice@example.com", "alice").await;

    let deactivated = h.admin.deactivate_user(user.id).await.unwrap();
    assert!(!deactivated.is_active);

    let login = h.accounts.login("alice", "SecurePass123").await;
    assert!(matches!(login, Err(AuthError::AccountDeactivated)));

    // Account state outranks the credential check.
    let wrong_password = h.accounts.login("alice", "WrongPass123").await;
    assert!(matches!(wrong_password, Err(AuthError::AccountDeactivated)));

    let reactivated = h.admin.reactivate_user(user.id).await.unwrap();
    assert!(reactivated.is_active);

    assert!(h.accounts.login("alice", "SecurePass123").await.is_ok());
}

#[tokio::test]
async fn test_deactivate_missing_user() {
    let h = harness();

    let result = h.admin.deactivate_user(999).await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));

    let result = h.admin.reactivate_user(999).await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn test_delete_removes_account_and_sessions() {
    let mut h = harness();
    let user = register_verified(&mut h, "alice@example.com", "alice").await;
    let (_, tokens) = h.accounts.login("alice", "SecurePass123").await.unwrap();

    let removed = h.admin.delete_user(user.id).await.unwrap();
    assert_eq!(removed.id, user.id);

    let login = h.accounts.login("alice", "SecurePass123").await;
    assert!(matches!(login, Err(AuthError::UserNotFound)));

    let rotate = h.accounts.rotate_refresh_token(&tokens.refresh_token).await;
    assert!(matches!(rotate, Err(AuthError::InvalidToken)));

    let again = h.admin.delete_user(user.id).await;
    assert!(matches!(again, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn test_deactivation_is_reversible_deletion_is_not() {
    let mut h = harness();
    let user = register_verified(&mut h, "alice@example.com", "alice").await;

    // Deactivation keeps the row, so the email stays taken.
    h.admin.deactivate_user(user.id).await.unwrap();
    let retake = h
        .accounts
        .register(RegisterRequest {
            email: "alice@example.com".to_string(),
            username: "alice2".to_string(),
            password: "SecurePass123".to_string(),
        })
        .await;
    assert!(matches!(retake, Err(AuthError::EmailAlreadyExists)));

    // Deletion frees it.
    h.admin.delete_user(user.id).await.unwrap();
    let retake = h
        .accounts
        .register(RegisterRequest {
            email: "alice@example.com".to_string(),
            username: "alice2".to_string(),
            password: "SecurePass123".to_string(),
        })
        .await;
    assert!(retake.is_ok());
}
