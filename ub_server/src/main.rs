//! User account and authentication server.
//!
//! Serves the JSON account API over axum with PostgreSQL-backed storage,
//! SMTP or console mail delivery, and optional Prometheus metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use userbase::admin::AdminManager;
use userbase::auth::{AccountManager, NewUser, TokenCodec, password};
use userbase::db::{Database, PgRefreshTokenRepository, PgUserRepository, UserRepository};
use userbase::mail::{ConsoleSender, EmailSender, Mailer, SmtpConfig, SmtpSender};

use ub_server::api;
use ub_server::config::ServerConfig;
use ub_server::{logging, metrics};

const HELP: &str = "\
Run the user account and authentication server

USAGE:
  ub_server [OPTIONS]
  ub_server create-superuser [--email ADDR] [--username NAME] [--password PASS]

OPTIONS:
  --bind     IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url   URL       PostgreSQL connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help           Print help information

SUBCOMMANDS:
  create-superuser     Seed a verified superuser account and exit
                       [defaults: admin@example.com / admin / admin]

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8000)
  DATABASE_URL                 PostgreSQL connection string
  JWT_SECRET                   Token signing secret (required, at least 32 chars)
  PASSWORD_PEPPER              Password hashing pepper (required, at least 16 chars)
  PUBLIC_URL                   External base URL used in emailed links
  REQUIRE_VERIFIED_LOGIN       Whether login requires a verified email  [default: true]
  ACCESS_TOKEN_TTL_SECS        Access token lifetime        [default: 3600]
  VERIFICATION_TOKEN_TTL_SECS  Verification token lifetime  [default: 300]
  RESET_TOKEN_TTL_SECS         Reset token lifetime         [default: 300]
  REFRESH_TOKEN_TTL_DAYS       Refresh token lifetime       [default: 30]
  METRICS_BIND                 Prometheus exporter bind address (optional)
  SMTP_HOST, SMTP_PORT, SMTP_USERNAME, SMTP_PASSWORD,
  SMTP_FROM_EMAIL, SMTP_FROM_NAME
                               SMTP delivery settings; emails go to the
                               console when unset
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let subcommand = pargs.subcommand()?;
    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    config.validate()?;

    match subcommand.as_deref() {
        Some("create-superuser") => create_superuser(&config, &mut pargs).await,
        Some(other) => Err(anyhow::anyhow!("Unknown subcommand: {other}")),
        None => serve(config).await,
    }
}

/// Seed a verified superuser account and exit
async fn create_superuser(config: &ServerConfig, pargs: &mut Arguments) -> Result<(), Error> {
    let email: String = pargs
        .opt_value_from_str("--email")?
        .unwrap_or_else(|| "admin@example.com".to_string());
    let username: String = pargs
        .opt_value_from_str("--username")?
        .unwrap_or_else(|| "admin".to_string());
    let password: String = pargs
        .opt_value_from_str("--password")?
        .unwrap_or_else(|| "admin".to_string());

    let db = Database::new(&config.database).await?;
    db.migrate().await?;

    let password_hash = password::hash_password(&password, &config.security.password_pepper)?;
    let users = PgUserRepository::new(db.pool().clone());

    let user = users
        .create_user(NewUser {
            email,
            username,
            password_hash,
            is_verified: true,
            is_superuser: true,
        })
        .await?;

    println!("Superuser created: {} (id {})", user.email, user.id);

    db.close().await;

    Ok(())
}

/// Run the HTTP server until interrupted
async fn serve(config: ServerConfig) -> Result<(), Error> {
    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        tracing::info!("Metrics exporter listening on {metrics_bind}");
    }

    let db = Database::new(&config.database).await?;
    db.health_check().await?;
    db.migrate().await?;
    tracing::info!("Database connected and migrations applied");

    let users = Arc::new(PgUserRepository::new(db.pool().clone()));
    let refresh_tokens = Arc::new(PgRefreshTokenRepository::new(db.pool().clone()));

    let mailer = match SmtpConfig::from_env() {
        Some(smtp_config) => {
            tracing::info!(host = %smtp_config.host, "Using SMTP mail delivery");
            let sender: Arc<dyn EmailSender> = Arc::new(SmtpSender::new(smtp_config)?);
            Mailer::spawn(sender)
        }
        None => {
            tracing::info!("SMTP not configured, writing emails to the console");
            Mailer::spawn(Arc::new(ConsoleSender::new()))
        }
    };

    let accounts = Arc::new(AccountManager::new(
        users.clone(),
        refresh_tokens,
        TokenCodec::new(&config.token_config()),
        mailer,
        config.account_config(),
    ));
    let admin = Arc::new(AdminManager::new(users));

    let state = api::AppState {
        accounts,
        admin,
        db: Some(db),
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, err))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| anyhow::anyhow!("Server error: {}", err))?;

    tracing::info!("Shutting down server");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
