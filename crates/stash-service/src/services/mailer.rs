//! Outbound mail collaborator
//!
//! Message content and delivery live outside this service; it only hands
//! over who to write to and which link to include.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// A password reset message to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetEmail {
    pub to: String,
    pub username: String,
    pub link: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &PasswordResetEmail) -> Result<(), MailerError>;
}

/// Records each dispatch in the log; the link is never written out
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &PasswordResetEmail) -> Result<(), MailerError> {
        info!(to = %email.to, username = %email.username, "Password reset email dispatched");
        Ok(())
    }
}

/// Keeps sent messages in memory so they can be inspected
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<PasswordResetEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first
    pub fn sent(&self) -> Vec<PasswordResetEmail> {
        self.outbox.lock().clone()
    }

    /// Most recent message addressed to `to`
    pub fn last_to(&self, to: &str) -> Option<PasswordResetEmail> {
        self.outbox
            .lock()
            .iter()
            .rev()
            .find(|email| email.to.eq_ignore_ascii_case(to))
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_password_reset(&self, email: &PasswordResetEmail) -> Result<(), MailerError> {
        self.outbox.lock().push(email.clone());
        Ok(())
    }
}
