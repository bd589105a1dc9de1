//! Account management: registration, authentication, session tokens,
//! email verification, and password reset.
//!
//! Features:
//! - Argon2id password hashing with a server-side pepper
//! - Signed stateless tokens with typed claims for access, email
//!   verification, and password reset
//! - Opaque refresh tokens backed by the store, revoked on rotation,
//!   logout, and password reset

pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod tokens;

pub use errors::{AuthError, AuthResult};
pub use manager::{AccountConfig, AccountManager};
pub use models::{NewUser, RefreshToken, RegisterRequest, SessionTokens, User, UserId, UserStats};
pub use tokens::{TokenClaims, TokenCodec, TokenConfig, TokenError, TokenKind};
