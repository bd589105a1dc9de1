//! Integration tests for the HTTP account API.
//!
//! Each test drives the full router over the in-memory store with a
//! captured mail queue; no network, database, or SMTP required.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt; // for `oneshot`
use ub_server::api::{AppState, create_router};
use userbase::admin::AdminManager;
use userbase::auth::{AccountConfig, AccountManager, NewUser, TokenCodec, TokenConfig, password};
use userbase::db::{MemoryStore, UserRepository};
use userbase::mail::{AccountEmail, Mailer};

const TEST_SECRET: &str = "test_jwt_secret_of_32_characters!!";
const TEST_PEPPER: &str = "test_pepper_16ch";

// ============================================================================
// Test Helpers
// ============================================================================

struct TestServer {
    app: Router,
    store: Arc<MemoryStore>,
    outbox: UnboundedReceiver<AccountEmail>,
}

fn create_test_server() -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let (mailer, outbox) = Mailer::channel();

    let accounts = Arc::new(AccountManager::new(
        store.clone(),
        store.clone(),
        TokenCodec::new(&TokenConfig::new(TEST_SECRET)),
        mailer,
        AccountConfig::new(TEST_PEPPER),
    ));
    let admin = Arc::new(AdminManager::new(store.clone()));

    let state = AppState {
        accounts,
        admin,
        db: None,
    };

    TestServer {
        app: create_router(state),
        store,
        outbox,
    }
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request(app, Method::POST, uri, None, Some(body)).await
}

async fn post_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    request(app, Method::POST, uri, Some(token), None).await
}

async fn get_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    request(app, Method::GET, uri, Some(token), None).await
}

/// Pull the token out of the next emailed link of the expected flavor.
fn next_link_token(server: &mut TestServer) -> String {
    loop {
        let email = server
            .outbox
            .try_recv()
            .expect("expected a queued email with a link");
        let link = match email {
            AccountEmail::Verification { link, .. } => link,
            AccountEmail::PasswordReset { link, .. } => link,
            _ => continue,
        };
        return link
            .split("token=")
            .nth(1)
            .expect("emailed link should carry a token")
            .to_string();
    }
}

async fn register(server: &TestServer, email: &str, username: &str, pass: &str) -> Value {
    let (status, body) = post_json(
        &server.app,
        "/api/auth/register",
        json!({ "email": email, "username": username, "password": pass }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body
}

async fn register_verified(server: &mut TestServer, email: &str, username: &str, pass: &str) {
    register(server, email, username, pass).await;
    let token = next_link_token(server);

    let (status, _) = post_json(
        &server.app,
        "/api/auth/verify-email",
        json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Log in and return (access_token, refresh_token).
async fn login(server: &TestServer, login: &str, pass: &str) -> (String, String) {
    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": login, "password": pass }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

/// Seed a verified superuser directly in the store and log it in.
async fn superuser_session(server: &TestServer) -> String {
    let password_hash = password::hash_password("RootPass123", TEST_PEPPER).unwrap();
    server
        .store
        .create_user(NewUser {
            email: "root@example.com".to_string(),
            username: "root".to_string(),
            password_hash,
            is_verified: true,
            is_superuser: true,
        })
        .await
        .unwrap();

    let (access, _) = login(server, "root", "RootPass123").await;
    access
}

// ============================================================================
// Health and Plumbing
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let (status, body) = request(&server.app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_request_id_header() {
    let server = create_test_server();

    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .header("x-request-id", "test-correlation-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-correlation-id"
    );

    // Absent from the request, the server generates one.
    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_public_fields_only() {
    let server = create_test_server();

    let body = register(&server, "alice@example.com", "alice", "SecurePass123").await;

    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["is_verified"], false);
    assert_eq!(body["is_superuser"], false);
    assert!(body["id"].is_i64());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_conflicts() {
    let server = create_test_server();
    register(&server, "alice@example.com", "alice", "SecurePass123").await;

    let (status, body) = post_json(
        &server.app,
        "/api/auth/register",
        json!({ "email": "alice@example.com", "username": "other", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = post_json(
        &server.app,
        "/api/auth/register",
        json!({ "email": "other@example.com", "username": "alice", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already taken");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_flow() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;

    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice", "password": "SecurePass123" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert!(body["user_id"].is_i64());
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    // Email works as the login too.
    let (status, _) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice@example.com", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_error_statuses() {
    let mut server = create_test_server();

    let (status, _) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "ghost", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    register(&server, "bob@example.com", "bob", "SecurePass123").await;
    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "bob", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Email not verified");

    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice", "password": "WrongPass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid password");
}

// ============================================================================
// Email Verification
// ============================================================================

#[tokio::test]
async fn test_verify_email_bad_tokens() {
    let server = create_test_server();

    let (status, _) = post_json(
        &server.app,
        "/api/auth/verify-email",
        json!({ "token": "not-a-real-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_verification_resends_email() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (access, _) = login(&server, "alice", "SecurePass123").await;

    let (status, _) = post_auth(&server.app, "/api/auth/request-verification", &access).await;
    assert_eq!(status, StatusCode::OK);

    let token = next_link_token(&mut server);
    let (status, _) = post_json(
        &server.app,
        "/api/auth/verify-email",
        json!({ "token": token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Bridge Pages
// ============================================================================

#[tokio::test]
async fn test_bridge_pages() {
    let server = create_test_server();

    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/verification-process?token=abc.def_123-x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("abc.def_123-x"));
    assert!(html.contains("/api/auth/verify-email"));

    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/reset-process?token=abc.def_123-x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Markup-hostile tokens never render.
    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/reset-process?token=%3Cscript%3E")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Session Lifecycle
// ============================================================================

#[tokio::test]
async fn test_refresh_rotation() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (_, refresh) = login(&server, "alice", "SecurePass123").await;

    let (status, body) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let rotated = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // The consumed token is dead; the rotated one works.
    let (status, body) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid token");

    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refresh_token": rotated }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_revokes_refresh_tokens() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (access, refresh) = login(&server, "alice", "SecurePass123").await;

    let (status, _) = post_auth(&server.app, "/api/auth/logout", &access).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let server = create_test_server();

    let (status, _) = request(&server.app, Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_auth(&server.app, "/api/user/me", "garbage-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_profile() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (access, refresh) = login(&server, "alice", "SecurePass123").await;

    let (status, body) = get_auth(&server.app, "/api/user/me", &access).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert!(body["id"].is_i64());

    // A refresh token is not an access credential.
    let (status, _) = get_auth(&server.app, "/api/user/me", &refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_response_is_uniform() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;

    let (known_status, known_body) = post_json(
        &server.app,
        "/api/auth/forgot-password",
        json!({ "email": "alice@example.com" }),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &server.app,
        "/api/auth/forgot-password",
        json!({ "email": "ghost@example.com" }),
    )
    .await;

    // Identical answers for existing and missing accounts.
    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;

    let (status, _) = post_json(
        &server.app,
        "/api/auth/forgot-password",
        json!({ "email": "alice@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = next_link_token(&mut server);
    let (status, _) = post_json(
        &server.app,
        "/api/auth/reset-password",
        json!({ "token": token, "password": "BrandNewPass456" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    login(&server, "alice", "BrandNewPass456").await;
}

#[tokio::test]
async fn test_reset_password_bad_token() {
    let server = create_test_server();

    let (status, _) = post_json(
        &server.app,
        "/api/auth/reset-password",
        json!({ "token": "nope", "password": "BrandNewPass456" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_routes_are_superuser_gated() {
    let mut server = create_test_server();
    let alice = register(&server, "alice@example.com", "alice", "SecurePass123").await;
    register_verified(&mut server, "bob@example.com", "bob", "SecurePass123").await;
    let (access, _) = login(&server, "bob", "SecurePass123").await;
    let alice_id = alice["id"].as_i64().unwrap();

    // No token at all.
    let (status, _) = request(
        &server.app,
        Method::GET,
        "/api/admin/statistic/users",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Authenticated but not a superuser.
    let (status, _) = get_auth(&server.app, "/api/admin/statistic/users", &access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refused deactivation leaves the target untouched.
    let (status, _) = request(
        &server.app,
        Method::POST,
        &format!("/api/admin/users/{alice_id}/deactivate"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice", "password": "SecurePass123" }),
    )
    .await;
    // Still unverified rather than deactivated, so the row never changed.
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Email not verified");
}

#[tokio::test]
async fn test_admin_user_stats() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    register(&server, "bob@example.com", "bob", "SecurePass123").await;
    let access = superuser_session(&server).await;

    let (status, body) = get_auth(&server.app, "/api/admin/statistic/users", &access).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["active"], 3);
    assert_eq!(body["verified"], 2);
    assert_eq!(body["superusers"], 1);
}

#[tokio::test]
async fn test_admin_deactivate_and_reactivate() {
    let mut server = create_test_server();
    let target = register(&server, "alice@example.com", "alice", "SecurePass123").await;
    register_verified(&mut server, "x@example.com", "x", "SecurePass123").await;
    let target_id = target["id"].as_i64().unwrap();
    let access = superuser_session(&server).await;

    let (status, body) = request(
        &server.app,
        Method::POST,
        &format!("/api/admin/users/{target_id}/deactivate"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = request(
        &server.app,
        Method::POST,
        &format!("/api/admin/users/{target_id}/reactivate"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);

    let (status, _) = request(
        &server.app,
        Method::POST,
        "/api/admin/users/424242/deactivate",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_delete_user() {
    let mut server = create_test_server();
    register_verified(&mut server, "alice@example.com", "alice", "SecurePass123").await;
    let (_, refresh) = login(&server, "alice", "SecurePass123").await;
    let access = superuser_session(&server).await;

    // alice registered first, so she holds id 1.
    let (status, body) = request(
        &server.app,
        Method::DELETE,
        "/api/admin/users/1",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    // The account and its sessions are gone.
    let (status, _) = post_json(
        &server.app,
        "/api/auth/login",
        json!({ "login": "alice", "password": "SecurePass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        &server.app,
        "/api/auth/refresh",
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &server.app,
        Method::DELETE,
        "/api/admin/users/1",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
