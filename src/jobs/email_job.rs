//! Email background job.
//!
//! Mail can be queued in Postgres through `QueueMailer` and delivered by
//! the `jobs work` worker, which hands each job to a `Mailer`.

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::{PgPool, PgPoolOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{EmailMessage, LogMailer, Mailer};

/// Email job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// Optional HTML alternative
    #[serde(default)]
    pub html: Option<String>,
}

impl From<EmailMessage> for EmailJob {
    fn from(message: EmailMessage) -> Self {
        Self {
            to: message.to,
            subject: message.subject,
            body: message.text,
            html: message.html,
        }
    }
}

impl From<EmailJob> for EmailMessage {
    fn from(job: EmailJob) -> Self {
        Self {
            to: job.to,
            subject: job.subject,
            text: job.body,
            html: job.html,
        }
    }
}

/// Email job handler - processes email sending jobs
pub async fn email_job_handler(job: EmailJob, mailer: Data<LogMailer>) -> Result<(), AppError> {
    tracing::info!(to = %job.to, subject = %job.subject, "Processing email job");
    mailer.send(job.into()).await?;
    Ok(())
}

/// Connect to Postgres and create the job tables if needed.
pub async fn job_pool(config: &Config) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(pool)
}

/// Mailer that defers delivery to the email worker.
#[derive(Clone)]
pub struct QueueMailer {
    storage: PostgresStorage<EmailJob>,
}

impl QueueMailer {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }

    pub async fn connect(config: &Config) -> AppResult<Self> {
        let pool = job_pool(config).await?;
        Ok(Self::new(PostgresStorage::new(pool)))
    }
}

#[async_trait]
impl Mailer for QueueMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(EmailJob::from(message))
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue email: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_carry_both_bodies() {
        let message = EmailMessage::text("a@campus.ac.uk", "Hello", "plain").with_html("<p>rich</p>");
        let job = EmailJob::from(message.clone());
        assert_eq!(job.body, "plain");
        assert_eq!(job.html.as_deref(), Some("<p>rich</p>"));
        assert_eq!(EmailMessage::from(job), message);
    }

    #[test]
    fn payload_without_html_deserializes() {
        let job: EmailJob =
            serde_json::from_str(r#"{"to":"a@b.c","subject":"s","body":"b"}"#).unwrap();
        assert!(job.html.is_none());
    }
}
