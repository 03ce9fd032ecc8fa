//! Background jobs.
//!
//! - Queued email delivery (apalis on Postgres)
//! - The daily discount digest and its scheduler
//! - The activity history simulator

mod activity_simulator;
mod discount_digest;
mod email_job;
mod scheduler;

pub use activity_simulator::{simulate_day, ActivitySimulator};
pub use discount_digest::{
    html_table, plain_text_table, DigestOutcome, DiscountDigest, DIGEST_FOOTER, DIGEST_SUBJECT,
};
pub use email_job::{email_job_handler, job_pool, EmailJob, QueueMailer};
pub use scheduler::{next_run_after, run_daily_backfill, run_daily_digest};
