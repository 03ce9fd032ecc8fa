//! Simulate command - run the sensor pipeline or the activity backfill.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::args::{SimulateArgs, SimulateTarget};
use crate::config::{Config, SENSOR_BUS_CAPACITY};
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence, UnitOfWork};
use crate::iot::{BuildingCatalog, SensorBus, SensorIngest, SensorSimulator};
use crate::jobs::ActivitySimulator;
use crate::services::{today, EnergyAnalytics, EnergyService};

/// Execute the simulate command
pub async fn execute(args: SimulateArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let uow = Arc::new(Persistence::new(db.get_connection()));

    match args.target {
        SimulateTarget::Sensors { ticks, interval } => {
            let interval = Duration::from_secs(interval.unwrap_or(config.sensor_interval_secs));
            let energy: Arc<dyn EnergyService> = Arc::new(EnergyAnalytics::new(uow));
            let shutdown = CancellationToken::new();

            let (publisher, ingest) =
                spawn_sensor_pipeline(&config, energy, interval, ticks, shutdown.clone());

            tokio::select! {
                _ = publisher => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal, stopping simulator...");
                }
            }
            shutdown.cancel();
            ingest
                .await
                .map_err(|e| AppError::internal(format!("Ingest task failed: {}", e)))?;
        }
        SimulateTarget::Activity => {
            let simulator = ActivitySimulator::new(uow.users(), uow.activities());
            let written = simulator.run(today() - ChronoDuration::days(1)).await?;
            println!("Logged {} simulated activities.", written);
        }
    }

    Ok(())
}

/// Start the meter publisher and the ingest consumer on a shared bus.
///
/// Both stop when `shutdown` is cancelled. With `ticks` the publisher stops
/// on its own and ingest follows once the bus closes.
pub fn spawn_sensor_pipeline(
    config: &Config,
    energy: Arc<dyn EnergyService>,
    interval: Duration,
    ticks: Option<u64>,
    shutdown: CancellationToken,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let bus = SensorBus::new(SENSOR_BUS_CAPACITY);
    let catalog = BuildingCatalog::load(&config.buildings_file);

    // Subscribe before spawning so the first round is not lost.
    let ingest = SensorIngest::new(energy, config.sensor_batch_size);
    let subscriptions = ingest.subscribe(&bus);
    let ingest_task = tokio::spawn(ingest.run(subscriptions, shutdown.clone()));

    let simulator = SensorSimulator::new(&catalog, bus, interval);
    let publisher_task = tokio::spawn(simulator.run(shutdown, ticks));

    (publisher_task, ingest_task)
}
