//! HTTP API for the account service.
//!
//! Route map:
//! - `GET  /health` - liveness plus database health
//! - `GET  /verification-process`, `GET /reset-process` - bridge pages
//!   for emailed links
//! - `POST /api/auth/*` - registration, login, verification, password
//!   reset, and refresh token rotation
//! - `POST /api/auth/logout`, `POST /api/auth/request-verification`,
//!   `GET /api/user/me` - bearer-token protected
//! - `/api/admin/*` - bearer-token protected and superuser gated

pub mod admin;
pub mod auth;
pub mod bridge;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod user;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use userbase::{AccountManager, AdminManager, db::Database};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountManager>,
    pub admin: Arc<AdminManager>,
    /// None when running over the in-memory store
    pub db: Option<Database>,
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/request-verification", post(auth::request_verification))
        .route("/user/me", get(user::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // The superuser gate sits inside the auth layer: authenticate first,
    // then check the flag.
    let admin_routes = Router::new()
        .route("/admin/statistic/users", get(admin::user_stats))
        .route("/admin/users/{user_id}/deactivate", post(admin::deactivate_user))
        .route("/admin/users/{user_id}/reactivate", post(admin::reactivate_user))
        .route("/admin/users/{user_id}", delete(admin::delete_user))
        .layer(axum::middleware::from_fn(middleware::superuser_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let root = Router::new()
        .route("/health", get(health_check))
        .route("/verification-process", get(bridge::verification_page))
        .route("/reset-process", get(bridge::reset_page));

    Router::new()
        .merge(root)
        .nest(
            "/api",
            Router::new().merge(public).merge(protected).merge(admin_routes),
        )
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match &state.db {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
