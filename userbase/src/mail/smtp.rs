//! SMTP email sender.

use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};

use super::{AccountEmail, EmailSender, MailError};

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

impl SmtpConfig {
    /// Read settings from environment variables, returning None when the
    /// required ones are unset so the caller can fall back to console
    /// delivery
    ///
    /// Required: `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
    /// `SMTP_FROM_EMAIL`. Optional: `SMTP_PORT` (default 465),
    /// `SMTP_FROM_NAME`.
    pub fn from_env() -> Option<Self> {
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|value| !value.is_empty())
        }

        let host = get_env("SMTP_HOST")?;
        let username = get_env("SMTP_USERNAME")?;
        let password = get_env("SMTP_PASSWORD")?;
        let from_email = get_env("SMTP_FROM_EMAIL")?;

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(465);

        Some(Self {
            host,
            port,
            username,
            password,
            from_email,
            from_name: get_env("SMTP_FROM_NAME"),
        })
    }
}

/// Delivers email over an authenticated SMTP relay
pub struct SmtpSender {
    transport: SmtpTransport,
    from_email: String,
    from_name: Option<String>,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.username, config.password);

        let transport = SmtpTransport::relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_email: config.from_email,
            from_name: config.from_name,
        })
    }

    fn from_address(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_email),
            None => self.from_email.clone(),
        }
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &AccountEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from_address().parse()?)
            .to(email.to().parse()?)
            .subject(email.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body())?;

        // The transport is blocking; keep it off the async runtime.
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        tracing::info!(to = %email.to(), subject = %email.subject(), "Email sent");

        Ok(())
    }
}
