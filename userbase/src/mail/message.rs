//! Account email templates.

/// Emails the account service sends
///
/// Subjects and bodies are rendered here so every sender implementation
/// delivers identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEmail {
    /// Verification link for a newly registered or re-requesting user
    Verification {
        to: String,
        username: String,
        link: String,
    },
    /// Confirmation that the address was verified
    VerificationConfirmed { to: String, username: String },
    /// Password reset link
    PasswordReset {
        to: String,
        username: String,
        link: String,
    },
    /// Confirmation that the password was changed
    PasswordResetConfirmed { to: String, username: String },
}

impl AccountEmail {
    /// Recipient address
    pub fn to(&self) -> &str {
        match self {
            AccountEmail::Verification { to, .. }
            | AccountEmail::VerificationConfirmed { to, .. }
            | AccountEmail::PasswordReset { to, .. }
            | AccountEmail::PasswordResetConfirmed { to, .. } => to,
        }
    }

    /// Message subject line
    pub fn subject(&self) -> &'static str {
        match self {
            AccountEmail::Verification { .. } => "Confirm your email address",
            AccountEmail::VerificationConfirmed { .. } => "Email confirmed",
            AccountEmail::PasswordReset { .. } => "Reset your password",
            AccountEmail::PasswordResetConfirmed { .. } => "Password reset",
        }
    }

    /// Plain-text message body
    pub fn body(&self) -> String {
        match self {
            AccountEmail::Verification { username, link, .. } => format!(
                "Dear {username},\n\n\
                 Please follow the link to verify your email address:\n\
                 {link}\n\n\
                 If you did not create this account, you can ignore this email.\n"
            ),
            AccountEmail::VerificationConfirmed { username, .. } => format!(
                "Dear {username},\n\n\
                 Your email address was successfully confirmed.\n"
            ),
            AccountEmail::PasswordReset { username, link, .. } => format!(
                "Dear {username},\n\n\
                 Please follow the link to reset your password:\n\
                 {link}\n\n\
                 If you did not request a reset, you can ignore this email.\n"
            ),
            AccountEmail::PasswordResetConfirmed { username, .. } => format!(
                "Dear {username},\n\n\
                 Your password was reset successfully.\n"
            ),
        }
    }
}
