//! Account email delivery.
//!
//! Messages are rendered by [`message::AccountEmail`], delivered by an
//! [`EmailSender`] implementation (SMTP or console), and queued through
//! the [`Mailer`] so account operations never block on, or fail because
//! of, the mail system.

pub mod console;
pub mod message;
pub mod smtp;

pub use console::ConsoleSender;
pub use message::AccountEmail;
pub use smtp::{SmtpConfig, SmtpSender};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    /// Invalid email address
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message could not be built
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP transport failure
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Delivery task failed
    #[error("Mail task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Delivers rendered account emails
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &AccountEmail) -> Result<(), MailError>;
}

/// Handle for queueing emails without waiting on delivery
///
/// Delivery runs on a background task; queueing never fails the calling
/// operation, and delivery failures are logged by the worker. Callers
/// queue mail only after the state change that justifies it has been
/// stored.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::UnboundedSender<AccountEmail>,
}

impl Mailer {
    /// Spawn the delivery worker over the given sender
    pub fn spawn(sender: Arc<dyn EmailSender>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AccountEmail>();

        tokio::spawn(async move {
            while let Some(email) = rx.recv().await {
                if let Err(err) = sender.send(&email).await {
                    tracing::warn!(to = %email.to(), error = %err, "Email delivery failed");
                }
            }
        });

        Self { tx }
    }

    /// Queue an email for delivery
    pub fn send(&self, email: AccountEmail) {
        if self.tx.send(email).is_err() {
            tracing::warn!("Mail worker has stopped, dropping email");
        }
    }

    /// Create a mailer whose queue is handed back to the caller instead of
    /// a worker, so tests can assert on what would have been sent
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AccountEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}
