//! Database configuration management.

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Connection acquisition timeout in seconds
    pub connection_timeout_secs: u64,
    /// How long a connection may sit idle before being closed, in seconds
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a single connection in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `DATABASE_URL` plus the optional pool knobs
    /// `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`,
    /// `DB_CONNECTION_TIMEOUT_SECS`, `DB_IDLE_TIMEOUT_SECS`, and
    /// `DB_MAX_LIFETIME_SECS`.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set.
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");

        Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: env_or("DB_MIN_CONNECTIONS", 5),
            connection_timeout_secs: env_or("DB_CONNECTION_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }

    /// Configuration for local development
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/userbase_db".to_string(),
            max_connections: 5,
            min_connections: 1,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 900,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/userbase_db".to_string(),
            max_connections: 20,
            min_connections: 5,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
