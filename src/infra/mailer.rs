//! Outbound email.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A rendered email. `html` is sent as the alternative part when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
}

impl EmailMessage {
    pub fn text(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// Writes mail to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             From: {}\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            self.from,
            message.to,
            message.subject,
            message.text
        );
        Ok(())
    }
}
