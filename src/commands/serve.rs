//! Serve command - Starts the HTTP server and background workers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::build_mailer;
use super::simulate::spawn_sensor_pipeline;
use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::{Config, ACTIVITY_BACKFILL_HOUR};
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, Mailer, Persistence, UnitOfWork};
use crate::jobs::{run_daily_backfill, run_daily_digest, ActivitySimulator, DiscountDigest};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    // Initialize database
    let db = if args.skip_migrations {
        Database::connect_without_migrations(&config).await
    } else {
        Database::connect(&config).await
    }
    .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let db = Arc::new(db);
    tracing::info!("Database connected");

    // Redis only backs auth rate limiting, so run without it if absent
    let cache = match Cache::try_connect(&config).await {
        Ok(cache) => {
            tracing::info!("Redis cache connected");
            Some(Arc::new(cache))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, auth rate limiting disabled");
            None
        }
    };

    let mailer = build_mailer(&config).await?;
    let app_state = AppState::from_config(db.clone(), cache, config.clone(), mailer.clone());

    let shutdown = CancellationToken::new();
    let workers = if args.no_background {
        Vec::new()
    } else {
        spawn_background(&app_state, &db, &config, mailer, &shutdown)
    };

    // Build router
    let app = create_router(app_state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    let signal = shutdown.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal, stopping...");
            signal.cancel();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    shutdown.cancel();
    for result in futures::future::join_all(workers).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Background task panicked");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Daily digest, the sensor publisher and ingest, and the activity
/// backfill when enabled.
fn spawn_background(
    state: &AppState,
    db: &Database,
    config: &Config,
    mailer: Arc<dyn Mailer>,
    shutdown: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let persistence = Persistence::new(db.get_connection());
    let digest = DiscountDigest::new(state.inventory_service.clone(), persistence.users(), mailer);
    let scheduler = tokio::spawn(run_daily_digest(digest, config.digest_hour, shutdown.clone()));

    let (publisher, ingest) = spawn_sensor_pipeline(
        config,
        state.energy_service.clone(),
        Duration::from_secs(config.sensor_interval_secs),
        None,
        shutdown.clone(),
    );

    let mut workers = vec![scheduler, publisher, ingest];
    if config.enable_activity_simulator {
        let simulator = ActivitySimulator::new(persistence.users(), persistence.activities());
        workers.push(tokio::spawn(run_daily_backfill(
            simulator,
            ACTIVITY_BACKFILL_HOUR,
            shutdown.clone(),
        )));
    }
    workers
}
