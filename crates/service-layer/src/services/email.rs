//! Mailer trait and implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{NotificationError, ServiceError};

/// A mail handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub address: String,
    pub body: String,
}

/// Trait for sending plain-text mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends a message to one address.
    async fn send_mail(&self, address: &str, body: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<SentMail>,
    fail_on_send: bool,
    attempts: usize,
}

/// In-memory mailer for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    state: Arc<RwLock<InMemoryMailerState>>,
}

impl InMemoryMailer {
    /// Creates a new in-memory mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mailer to fail every send call.
    pub fn set_fail_on_send(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on_send = fail;
        }
    }

    /// Returns the number of send calls, failed ones included.
    pub fn send_attempts(&self) -> usize {
        self.state.read().map(|state| state.attempts).unwrap_or(0)
    }

    /// Returns the mails sent so far.
    pub fn sent(&self) -> Vec<SentMail> {
        self.state
            .read()
            .map(|state| state.sent.clone())
            .unwrap_or_default()
    }

    /// Returns the number of mails sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().map(|state| state.sent.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send_mail(&self, address: &str, body: &str) -> Result<(), ServiceError> {
        let mut state = self.state.write().map_err(|_| NotificationError::Mail {
            address: address.to_string(),
            reason: "mailer state poisoned".to_string(),
        })?;

        state.attempts += 1;
        if state.fail_on_send {
            return Err(NotificationError::Mail {
                address: address.to_string(),
                reason: "SMTP server unavailable".to_string(),
            }
            .into());
        }

        state.sent.push(SentMail {
            address: address.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Mailer that writes each mail to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send_mail(&self, address: &str, body: &str) -> Result<(), ServiceError> {
        tracing::info!(%address, %body, "mail sent");
        Ok(())
    }
}
