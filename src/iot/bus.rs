//! In-process publish/subscribe bus with one topic per energy category.

use tokio::sync::broadcast;

use crate::config::{TOPIC_ELECTRICITY, TOPIC_GAS};
use crate::domain::{EnergyCategory, SensorPayload};
use crate::errors::{AppError, AppResult};

/// A message as delivered to subscribers: topic plus JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: &'static str,
    pub payload: String,
}

#[derive(Clone)]
pub struct SensorBus {
    electricity: broadcast::Sender<BusMessage>,
    gas: broadcast::Sender<BusMessage>,
}

pub fn topic_for(category: EnergyCategory) -> &'static str {
    match category {
        EnergyCategory::Electricity => TOPIC_ELECTRICITY,
        EnergyCategory::Gas => TOPIC_GAS,
    }
}

pub fn category_for(topic: &str) -> Option<EnergyCategory> {
    match topic {
        TOPIC_ELECTRICITY => Some(EnergyCategory::Electricity),
        TOPIC_GAS => Some(EnergyCategory::Gas),
        _ => None,
    }
}

impl SensorBus {
    pub fn new(capacity: usize) -> Self {
        let (electricity, _) = broadcast::channel(capacity);
        let (gas, _) = broadcast::channel(capacity);
        Self { electricity, gas }
    }

    fn sender(&self, category: EnergyCategory) -> &broadcast::Sender<BusMessage> {
        match category {
            EnergyCategory::Electricity => &self.electricity,
            EnergyCategory::Gas => &self.gas,
        }
    }

    /// Publish a reading; returns how many subscribers received it.
    pub fn publish(&self, category: EnergyCategory, payload: &SensorPayload) -> AppResult<usize> {
        let message = BusMessage {
            topic: topic_for(category),
            payload: serde_json::to_string(payload)
                .map_err(|e| AppError::internal(format!("Failed to encode reading: {}", e)))?,
        };
        // No subscriber is not an error; the reading is simply dropped.
        Ok(self.sender(category).send(message).unwrap_or(0))
    }

    pub fn subscribe(&self, category: EnergyCategory) -> broadcast::Receiver<BusMessage> {
        self.sender(category).subscribe()
    }
}

/// Decode a bus message back into its category and payload.
pub fn decode(message: &BusMessage) -> AppResult<(EnergyCategory, SensorPayload)> {
    let category = category_for(message.topic)
        .ok_or_else(|| AppError::BadRequest(format!("unknown topic '{}'", message.topic)))?;
    let payload = serde_json::from_str(&message.payload)
        .map_err(|e| AppError::BadRequest(format!("malformed reading: {}", e)))?;
    Ok((category, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn payload() -> SensorPayload {
        SensorPayload {
            timestamp: Utc::now(),
            building: "Main Library".into(),
            building_code: "LIB".into(),
            zone: "Central".into(),
            value: 412.5,
        }
    }

    #[tokio::test]
    async fn topics_are_kept_apart() {
        let bus = SensorBus::new(8);
        let mut gas = bus.subscribe(EnergyCategory::Gas);

        bus.publish(EnergyCategory::Electricity, &payload()).unwrap();
        bus.publish(EnergyCategory::Gas, &payload()).unwrap();

        let message = gas.recv().await.unwrap();
        assert_eq!(message.topic, "gas");
        assert!(gas.try_recv().is_err());

        let (category, decoded) = decode(&message).unwrap();
        assert_eq!(category, EnergyCategory::Gas);
        assert_eq!(decoded.building, "Main Library");
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = SensorBus::new(8);
        assert_eq!(bus.publish(EnergyCategory::Gas, &payload()).unwrap(), 0);
    }
}
