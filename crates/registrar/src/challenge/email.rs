//! Emailed verification codes.

use rand::Rng;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use themis_common::CacheError;
use themis_common::constants::{EMAIL_CODE_LENGTH, cache_keys::EMAIL_CODE_PREFIX};

use crate::cache::CodeCache;
use crate::mailer::{CodeSender, DeliveryError};

static EMAIL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

#[derive(Debug, Error)]
pub enum CodeIssueError {
    #[error("invalid email format")]
    InvalidEmail,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("failed to store verification code: {0}")]
    CacheWrite(CacheError),
}

/// Generates, delivers, and caches emailed verification codes.
pub struct EmailCodeIssuer {
    cache: Arc<dyn CodeCache>,
    mailer: Arc<dyn CodeSender>,
}

impl EmailCodeIssuer {
    pub fn new(cache: Arc<dyn CodeCache>, mailer: Arc<dyn CodeSender>) -> Self {
        Self { cache, mailer }
    }

    /// Issue a fresh code for `email`.
    ///
    /// Delivery happens before the cache write; a code that could not be
    /// delivered is never considered live. The code itself is not
    /// returned - email is the only channel.
    pub async fn issue(&self, email: &str) -> Result<(), CodeIssueError> {
        if !EMAIL_RE.is_match(email) {
            tracing::warn!(email = %email, "rejected malformed email");
            return Err(CodeIssueError::InvalidEmail);
        }

        let code = generate_code();
        let issued_at = chrono::Utc::now().timestamp();

        self.mailer.send_email_code(email, &code).await?;

        let key = format!("{EMAIL_CODE_PREFIX}{email}");
        self.cache
            .put(&key, &code, issued_at)
            .await
            .map_err(CodeIssueError::CacheWrite)?;

        tracing::debug!(email = %email, "issued email verification code");
        Ok(())
    }
}

/// Random numeric code, fixed width, leading zeros allowed.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..EMAIL_CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCodeCache;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records deliveries; optionally fails every send.
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new(fail: bool) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl CodeSender for RecordingMailer {
        async fn send_email_code(&self, email: &str, code: &str) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Send("smtp down".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    #[test]
    fn generated_codes_are_fixed_width_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), EMAIL_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_any_io() {
        let cache = Arc::new(MemoryCodeCache::new(300));
        let mailer = Arc::new(RecordingMailer::new(false));
        let issuer = EmailCodeIssuer::new(cache, mailer.clone());

        let err = issuer.issue("not-an-email").await.unwrap_err();
        assert!(matches!(err, CodeIssueError::InvalidEmail));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivered_code_becomes_the_live_challenge() {
        let cache = Arc::new(MemoryCodeCache::new(300));
        let mailer = Arc::new(RecordingMailer::new(false));
        let issuer = EmailCodeIssuer::new(cache.clone(), mailer.clone());

        issuer.issue("a@x.com").await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        let (_, code) = &sent[0];
        let cached = cache.get("email_code:a@x.com").await.unwrap();
        assert_eq!(&cached, code);
    }

    #[tokio::test]
    async fn failed_delivery_leaves_no_live_code() {
        let cache = Arc::new(MemoryCodeCache::new(300));
        let mailer = Arc::new(RecordingMailer::new(true));
        let issuer = EmailCodeIssuer::new(cache.clone(), mailer);

        let err = issuer.issue("a@x.com").await.unwrap_err();
        assert!(matches!(err, CodeIssueError::Delivery(_)));
        assert!(cache.get("email_code:a@x.com").await.is_err());
    }
}
