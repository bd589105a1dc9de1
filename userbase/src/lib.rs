//! # Userbase
//!
//! A user account and authentication library.
//!
//! Provides registration, credential verification, email verification,
//! password reset, session token issuance and rotation, and superuser
//! account administration over a pluggable store.
//!
//! ## Architecture
//!
//! - [`auth`]: the account manager, Argon2id password hashing, and the
//!   token codec. Access, email verification, and password reset tokens
//!   are signed stateless JWTs; refresh tokens are opaque store-backed
//!   strings that are revoked on rotation.
//! - [`admin`]: superuser operations: aggregate statistics, deactivate
//!   and reactivate, and permanent deletion.
//! - [`db`]: repository traits with PostgreSQL and in-memory
//!   implementations, pool management, and schema migrations.
//! - [`mail`]: templated account emails delivered by a background worker
//!   over SMTP or the console.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use userbase::auth::{AccountConfig, AccountManager, RegisterRequest, TokenCodec, TokenConfig};
//! use userbase::db::MemoryStore;
//! use userbase::mail::{ConsoleSender, Mailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let accounts = AccountManager::new(
//!         store.clone(),
//!         store,
//!         TokenCodec::new(&TokenConfig::new("jwt_secret_of_at_least_32_chars!!!")),
//!         Mailer::spawn(Arc::new(ConsoleSender::new())),
//!         AccountConfig::new("secret_pepper_16"),
//!     );
//!
//!     let user = accounts
//!         .register(RegisterRequest {
//!             email: "alice@example.com".to_string(),
//!             username: "alice".to_string(),
//!             password: "SecurePass123".to_string(),
//!         })
//!         .await?;
//!
//!     println!("Registered {} (id {})", user.username, user.id);
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod auth;
pub mod db;
pub mod mail;

pub use admin::AdminManager;
pub use auth::{AccountConfig, AccountManager, AuthError, AuthResult};
pub use db::{Database, DatabaseConfig, MemoryStore};
pub use mail::Mailer;
