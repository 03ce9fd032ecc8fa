//! Jobs command - Background job management.
//!
//! - `work`: deliver queued email
//! - `digest`: send the discount digest once, now
//! - `list`: show the email queue by status
//! - `clear`: remove failed jobs from the queue

use std::collections::BTreeMap;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use super::build_mailer;
use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::Config;
use crate::domain::PricingEngine;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, LogMailer, Persistence, UnitOfWork};
use crate::jobs::{email_job_handler, job_pool, DiscountDigest, EmailJob};
use crate::services::InventoryManager;

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::Digest => send_digest(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Deliver queued email until Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    let pool = job_pool(config).await?;
    let storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);

    let worker = WorkerBuilder::new("email-worker")
        .data(LogMailer::new(config.mail_from.clone()))
        .backend(storage)
        .build_fn(email_job_handler);

    tracing::info!("Email worker started. Press Ctrl+C to stop.");

    tokio::select! {
        result = Monitor::new().register(worker).run() => {
            result.map_err(|e| AppError::internal(format!("Worker failed: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Email worker stopped");
    Ok(())
}

async fn send_digest(config: &Config) -> AppResult<()> {
    let db = Database::connect(config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let uow = Arc::new(Persistence::new(db.get_connection()));
    let inventory = Arc::new(InventoryManager::new(
        uow.clone(),
        PricingEngine::new(config.discount_fallback),
    ));

    let digest = DiscountDigest::new(inventory, uow.users(), build_mailer(config).await?);
    let outcome = digest.run().await?;
    println!("{:?}", outcome);
    Ok(())
}

async fn queue_connection(config: &Config) -> AppResult<Option<DatabaseConnection>> {
    let db = Database::connect_without_migrations(config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?
        .get_connection();

    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;
    let initialized = row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false);

    Ok(initialized.then_some(db))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Run 'jobs work' once to create it.");
        return Ok(());
    };

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status",
        ))
        .await?;

    let mut counts: BTreeMap<String, i64> = ["Pending", "Running", "Failed", "Done"]
        .into_iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    for row in rows {
        if let (Ok(status), Ok(count)) = (
            row.try_get::<String>("", "status"),
            row.try_get::<i64>("", "count"),
        ) {
            counts.insert(status, count);
        }
    }

    println!("\n=== Email Queue ===");
    for (status, count) in &counts {
        println!("{:<9} {}", format!("{}:", status), count);
    }
    println!("===================\n");
    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    };

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    println!("Cleared {} failed job(s).", result.rows_affected());
    Ok(())
}
