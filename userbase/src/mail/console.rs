//! Console email sender for development.

use async_trait::async_trait;

use super::{AccountEmail, EmailSender, MailError};

/// Writes emails to stdout instead of delivering them
pub struct ConsoleSender;

impl ConsoleSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailSender for ConsoleSender {
    async fn send(&self, email: &AccountEmail) -> Result<(), MailError> {
        println!();
        println!("========================================");
        println!("  EMAIL TO: {}", email.to());
        println!("  SUBJECT:  {}", email.subject());
        println!("----------------------------------------");
        println!("{}", email.body());
        println!("========================================");
        println!();

        tracing::info!(to = %email.to(), subject = %email.subject(), "Email written to console");

        Ok(())
    }
}
