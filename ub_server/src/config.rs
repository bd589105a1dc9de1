//! Server configuration management.
//!
//! Consolidates environment variable reads and provides validated
//! configuration for every server component.

use std::net::SocketAddr;

use chrono::Duration;
use userbase::auth::{AccountConfig, TokenConfig};
use userbase::db::DatabaseConfig;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Lifetimes for issued tokens
    pub token_ttls: TokenTtlConfig,
    /// Account service policy
    pub account: AccountPolicyConfig,
    /// Optional Prometheus exporter bind address
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Token signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

/// Lifetimes for issued tokens
#[derive(Debug, Clone)]
pub struct TokenTtlConfig {
    pub access_ttl_secs: i64,
    pub verification_ttl_secs: i64,
    pub reset_ttl_secs: i64,
    pub refresh_ttl_days: i64,
}

/// Account policy knobs
#[derive(Debug, Clone)]
pub struct AccountPolicyConfig {
    /// External base URL used in emailed links
    pub public_url: String,
    /// Whether login requires a verified email address
    pub require_verified_login: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with optional
    /// command-line overrides
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Bind address from the command line, if given
    /// * `database_url_override` - Database URL from the command line, if
    ///   given
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or a
    /// value fails validation.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|value| value.parse().ok())
            })
            .unwrap_or_else(|| {
                "127.0.0.1:8000"
                    .parse()
                    .expect("Default bind address is valid")
            });

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "postgres://postgres@localhost/userbase_db".to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 10),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        };

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        if jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters".to_string(),
            });
        }

        if password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters".to_string(),
            });
        }

        let token_ttls = TokenTtlConfig {
            access_ttl_secs: parse_env_or("ACCESS_TOKEN_TTL_SECS", 3600),
            verification_ttl_secs: parse_env_or("VERIFICATION_TOKEN_TTL_SECS", 300),
            reset_ttl_secs: parse_env_or("RESET_TOKEN_TTL_SECS", 300),
            refresh_ttl_days: parse_env_or("REFRESH_TOKEN_TTL_DAYS", 30),
        };

        let account = AccountPolicyConfig {
            public_url: std::env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://{bind}")),
            require_verified_login: parse_env_or("REQUIRE_VERIFIED_LOGIN", true),
        };

        let metrics_bind = std::env::var("METRICS_BIND")
            .ok()
            .and_then(|value| value.parse().ok());

        Ok(ServerConfig {
            bind,
            database,
            security: SecurityConfig {
                jwt_secret,
                password_pepper,
            },
            token_ttls,
            account,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ttls = [
            ("ACCESS_TOKEN_TTL_SECS", self.token_ttls.access_ttl_secs),
            (
                "VERIFICATION_TOKEN_TTL_SECS",
                self.token_ttls.verification_ttl_secs,
            ),
            ("RESET_TOKEN_TTL_SECS", self.token_ttls.reset_ttl_secs),
            ("REFRESH_TOKEN_TTL_DAYS", self.token_ttls.refresh_ttl_days),
        ];

        for (var, value) in ttls {
            if value <= 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Token codec configuration derived from this config
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.security.jwt_secret.clone(),
            access_ttl: Duration::seconds(self.token_ttls.access_ttl_secs),
            verification_ttl: Duration::seconds(self.token_ttls.verification_ttl_secs),
            reset_ttl: Duration::seconds(self.token_ttls.reset_ttl_secs),
        }
    }

    /// Account manager configuration derived from this config
    pub fn account_config(&self) -> AccountConfig {
        AccountConfig {
            pepper: self.security.password_pepper.clone(),
            public_url: self.account.public_url.clone(),
            require_verified_login: self.account.require_verified_login,
            refresh_token_ttl: Duration::days(self.token_ttls.refresh_ttl_days),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}. {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an environment variable or fall back to a default
fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
