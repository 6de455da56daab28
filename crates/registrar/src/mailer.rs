//! Code delivery channel.
//!
//! The SMTP relay is an external collaborator; the service only depends
//! on this trait. Delivery is the single channel a code ever travels
//! through: issue endpoints never return the code to the caller.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email delivery failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_email_code(&self, email: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Development delivery: writes the code to the log instead of SMTP.
pub struct LogMailer;

#[async_trait]
impl CodeSender for LogMailer {
    async fn send_email_code(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(email = %email, code = %code, "dev mailer: delivering verification code");
        Ok(())
    }
}
