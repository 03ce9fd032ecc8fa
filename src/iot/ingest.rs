//! Subscriber that batches bus readings into the energy store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::bus::{decode, BusMessage};
use super::SensorBus;
use crate::config::SENSOR_FLUSH_SECS;
use crate::domain::{EnergyCategory, SensorPayload};
use crate::services::EnergyService;

type Reading = (EnergyCategory, SensorPayload);

/// Receivers for both topics, taken before the consumer task starts.
pub struct Subscriptions {
    electricity: Receiver<BusMessage>,
    gas: Receiver<BusMessage>,
}

/// Buffers readings and hands them to the energy service in batches.
///
/// A batch is written when it reaches `batch_size`, when the flush timer
/// fires with something buffered, and once more on shutdown. Storage
/// failures are logged and the readings in that batch are dropped.
pub struct SensorIngest {
    energy: Arc<dyn EnergyService>,
    batch_size: usize,
    flush_every: Duration,
}

impl SensorIngest {
    pub fn new(energy: Arc<dyn EnergyService>, batch_size: usize) -> Self {
        Self {
            energy,
            batch_size: batch_size.max(1),
            flush_every: Duration::from_secs(SENSOR_FLUSH_SECS),
        }
    }

    pub fn with_flush_interval(mut self, every: Duration) -> Self {
        self.flush_every = every;
        self
    }

    pub fn subscribe(&self, bus: &SensorBus) -> Subscriptions {
        Subscriptions {
            electricity: bus.subscribe(EnergyCategory::Electricity),
            gas: bus.subscribe(EnergyCategory::Gas),
        }
    }

    pub async fn run(self, subscriptions: Subscriptions, shutdown: CancellationToken) {
        let Subscriptions {
            mut electricity,
            mut gas,
        } = subscriptions;
        let mut batch: Vec<Reading> = Vec::with_capacity(self.batch_size);

        let mut ticker = tokio::time::interval(self.flush_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tracing::info!(batch_size = self.batch_size, "Sensor ingest started");

        let mut gas_first = false;
        loop {
            // Drain pending readings before honouring the timer or shutdown.
            let open = tokio::select! {
                biased;
                received = recv_either(&mut electricity, &mut gas, gas_first) => {
                    gas_first = !gas_first;
                    accept(received, &mut batch)
                }
                _ = shutdown.cancelled() => false,
                _ = ticker.tick() => {
                    self.flush(&mut batch).await;
                    true
                }
            };
            if !open {
                break;
            }
            if batch.len() >= self.batch_size {
                self.flush(&mut batch).await;
            }
        }

        self.flush(&mut batch).await;
        tracing::info!("Sensor ingest stopped");
    }

    async fn flush(&self, batch: &mut Vec<Reading>) {
        if batch.is_empty() {
            return;
        }
        let readings = std::mem::take(batch);
        let received = readings.len();
        match self.energy.ingest(readings).await {
            Ok(stored) => tracing::debug!(received, stored, "Sensor batch stored"),
            Err(e) => tracing::error!(received, error = %e, "Failed to store sensor batch"),
        }
    }
}

/// Next message from either topic, trying `second` first when asked.
/// Callers alternate `second_first` so neither topic starves.
async fn recv_either(
    first: &mut Receiver<BusMessage>,
    second: &mut Receiver<BusMessage>,
    second_first: bool,
) -> Result<BusMessage, RecvError> {
    if second_first {
        tokio::select! {
            biased;
            received = second.recv() => received,
            received = first.recv() => received,
        }
    } else {
        tokio::select! {
            biased;
            received = first.recv() => received,
            received = second.recv() => received,
        }
    }
}

/// Buffer one message; false once the bus has closed.
fn accept(received: Result<BusMessage, RecvError>, batch: &mut Vec<Reading>) -> bool {
    match received {
        Ok(message) => {
            match decode(&message) {
                Ok(reading) => batch.push(reading),
                Err(e) => tracing::warn!(topic = message.topic, error = %e, "Skipping reading"),
            }
            true
        }
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Sensor ingest fell behind the bus");
            true
        }
        Err(RecvError::Closed) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::MockEnergyService;
    use chrono::Utc;

    fn payload(building: &str) -> SensorPayload {
        SensorPayload {
            timestamp: Utc::now(),
            building: building.to_string(),
            building_code: String::new(),
            zone: String::new(),
            value: 12.5,
        }
    }

    #[test]
    fn malformed_messages_are_skipped() {
        let mut batch = Vec::new();
        let message = BusMessage {
            topic: "gas",
            payload: "not json".into(),
        };
        assert!(accept(Ok(message), &mut batch));
        assert!(batch.is_empty());
        assert!(!accept(Err(RecvError::Closed), &mut batch));
    }

    #[tokio::test]
    async fn full_batches_are_written_and_the_rest_on_shutdown() {
        let mut energy = MockEnergyService::new();
        energy
            .expect_ingest()
            .withf(|batch| batch.len() == 2)
            .times(1)
            .returning(|batch| Ok(batch.len() as u64));
        energy
            .expect_ingest()
            .withf(|batch| batch.len() == 1)
            .times(1)
            .returning(|_| Err(AppError::internal("db down")));

        let bus = SensorBus::new(16);
        let shutdown = CancellationToken::new();
        let ingest = SensorIngest::new(Arc::new(energy), 2).with_flush_interval(Duration::from_secs(3600));

        let subscriptions = ingest.subscribe(&bus);
        for name in ["Main Library", "Student Union", "Oak House Flat 1"] {
            bus.publish(EnergyCategory::Gas, &payload(name)).unwrap();
        }
        shutdown.cancel();
        ingest.run(subscriptions, shutdown).await;
    }

    #[tokio::test]
    async fn busy_topics_take_turns() {
        let mut energy = MockEnergyService::new();
        energy
            .expect_ingest()
            .withf(|batch| {
                let gas = batch.iter().filter(|r| r.0 == EnergyCategory::Gas).count();
                batch.len() == 2 && gas == 1
            })
            .times(4)
            .returning(|batch| Ok(batch.len() as u64));

        let bus = SensorBus::new(16);
        let shutdown = CancellationToken::new();
        let ingest = SensorIngest::new(Arc::new(energy), 2).with_flush_interval(Duration::from_secs(3600));

        let subscriptions = ingest.subscribe(&bus);
        for n in 0..4 {
            let name = format!("Oak House Flat {}", n);
            bus.publish(EnergyCategory::Electricity, &payload(&name)).unwrap();
            bus.publish(EnergyCategory::Gas, &payload(&name)).unwrap();
        }
        shutdown.cancel();
        ingest.run(subscriptions, shutdown).await;
    }

    #[tokio::test]
    async fn flush_timer_writes_partial_batches() {
        let mut energy = MockEnergyService::new();
        energy
            .expect_ingest()
            .withf(|batch| batch.len() == 1 && batch[0].0 == EnergyCategory::Electricity)
            .times(1)
            .returning(|batch| Ok(batch.len() as u64));

        let bus = SensorBus::new(16);
        let shutdown = CancellationToken::new();
        let ingest = SensorIngest::new(Arc::new(energy), 100).with_flush_interval(Duration::from_millis(20));
        let subscriptions = ingest.subscribe(&bus);
        bus.publish(EnergyCategory::Electricity, &payload("Main Library")).unwrap();

        let task = tokio::spawn(ingest.run(subscriptions, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        task.await.unwrap();
    }
}
