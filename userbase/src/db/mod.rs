//! Database layer with connection pooling and repositories.

pub mod config;
pub mod memory;
pub mod repository;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use repository::{
    PgRefreshTokenRepository, PgUserRepository, RefreshTokenRepository, UserRepository,
};

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Database connection manager
///
/// # Example
///
/// ```no_run
/// use userbase::db::{Database, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), sqlx::Error> {
///     let config = DatabaseConfig::development();
///     let db = Database::new(&config).await?;
///     db.health_check().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a connection pool from the given configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Verify the database is reachable
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    /// Close all pool connections gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
