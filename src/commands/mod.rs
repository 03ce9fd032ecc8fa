//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

pub mod jobs;
pub mod migrate;
pub mod serve;
pub mod simulate;

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{LogMailer, Mailer};
use crate::jobs::QueueMailer;

/// The mailer selected by `MAIL_QUEUE`.
pub async fn build_mailer(config: &Config) -> AppResult<Arc<dyn Mailer>> {
    if config.mail_queue {
        tracing::info!("Queueing outbound mail for the email worker");
        Ok(Arc::new(QueueMailer::connect(config).await?))
    } else {
        Ok(Arc::new(LogMailer::new(config.mail_from.clone())))
    }
}
