//! Simulated meters publishing readings onto the sensor bus.

use std::time::Duration;

use chrono::{DateTime, Datelike, Local, Timelike, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use super::{BuildingCatalog, Meter, SensorBus};
use crate::domain::{EnergyCategory, SensorPayload};

/// A plausible reading for the given local time.
///
/// Working hours (08:00 to 17:59) draw from a higher band; weekends scale
/// electricity by 0.6 and gas by 0.5.
pub fn generate_reading<R: Rng + ?Sized>(
    category: EnergyCategory,
    at: DateTime<Local>,
    rng: &mut R,
) -> f64 {
    let working_hours = (8..=17).contains(&at.hour());
    let weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun);

    let (value, weekend_factor): (f64, f64) = match category {
        EnergyCategory::Electricity => {
            let v = if working_hours {
                rng.gen_range(300.0..=600.0)
            } else {
                rng.gen_range(50.0..=200.0)
            };
            (v, 0.6)
        }
        EnergyCategory::Gas => {
            let v = if working_hours {
                rng.gen_range(20.0..=50.0)
            } else {
                rng.gen_range(5.0..=20.0)
            };
            (v, 0.5)
        }
    };

    let value = if weekend { value * weekend_factor } else { value };
    (value * 100.0).round() / 100.0
}

pub struct SensorSimulator {
    meters: Vec<Meter>,
    bus: SensorBus,
    interval: Duration,
}

impl SensorSimulator {
    pub fn new(catalog: &BuildingCatalog, bus: SensorBus, interval: Duration) -> Self {
        Self {
            meters: catalog.meters(),
            bus,
            interval,
        }
    }

    /// Publish one reading per meter and category; returns how many were
    /// published.
    pub fn publish_round<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let now = Local::now();
        let timestamp: DateTime<Utc> = now.with_timezone(&Utc);
        let mut published = 0;

        for meter in &self.meters {
            for category in EnergyCategory::ALL {
                let payload = SensorPayload {
                    timestamp,
                    building: meter.name.clone(),
                    building_code: meter.code.clone(),
                    zone: meter.zone.clone(),
                    value: generate_reading(category, now, rng),
                };
                match self.bus.publish(category, &payload) {
                    Ok(_) => published += 1,
                    Err(e) => tracing::warn!(meter = %meter.name, error = %e, "Reading not published"),
                }
            }
        }
        published
    }

    /// Publish a round every interval until cancelled or, when `ticks` is
    /// set, until that many rounds have gone out.
    pub async fn run(self, shutdown: CancellationToken, ticks: Option<u64>) {
        if self.meters.is_empty() {
            tracing::warn!("No meters configured, sensor simulator idle");
            return;
        }

        let mut rng = StdRng::from_entropy();
        let mut ticker = tokio::time::interval(self.interval);
        let mut rounds = 0u64;
        tracing::info!(meters = self.meters.len(), interval = ?self.interval, "Sensor simulator started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let published = self.publish_round(&mut rng);
                    tracing::debug!(published, "Sensor round published");
                    rounds += 1;
                    if ticks.is_some_and(|limit| rounds >= limit) {
                        break;
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!(rounds, "Sensor simulator stopped");
    }
}
