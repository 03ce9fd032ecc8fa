//! Energy service - chart traces, the zone dashboard and sensor ingest.

use async_trait::async_trait;
use chrono::Utc;
use futures::try_join;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::energy::{emissions_trace, usage_trace};
use crate::domain::{
    ChartRequest, ChartResponse, EnergyCategory, EnergyDashboard, EnergyReading, LabelledSeries,
    SensorPayload,
};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EnergyService: Send + Sync {
    /// One raw usage line per requested building and energy type.
    async fn usage_traces(&self, request: ChartRequest) -> AppResult<ChartResponse>;

    /// One daily CO2 line per requested building.
    async fn emission_traces(&self, request: ChartRequest) -> AppResult<ChartResponse>;

    async fn dashboard(&self) -> AppResult<EnergyDashboard>;

    /// Persist a batch of sensor messages, creating unseen buildings.
    async fn ingest(&self, batch: Vec<(EnergyCategory, SensorPayload)>) -> AppResult<u64>;
}

pub struct EnergyAnalytics<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> EnergyAnalytics<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn zone_series(rows: Vec<(String, f64)>) -> LabelledSeries {
    let mut totals = BTreeMap::new();
    for (zone, total) in rows {
        *totals.entry(zone).or_insert(0.0) += total;
    }
    LabelledSeries::from_totals(totals)
}

#[async_trait]
impl<U: UnitOfWork> EnergyService for EnergyAnalytics<U> {
    async fn usage_traces(&self, request: ChartRequest) -> AppResult<ChartResponse> {
        let (from, to) = request.window(Utc::now())?;
        let energy = self.uow.energy();

        let mut traces = Vec::new();
        for name in &request.buildings {
            let Some(building) = energy.find_building(name).await? else {
                tracing::debug!(building = %name, "Unknown building in chart request");
                continue;
            };
            for category in request.energy_type.categories() {
                let readings = energy.readings(building.id, category, from, to).await?;
                traces.push(usage_trace(&building.name, category, &readings));
            }
        }
        Ok(ChartResponse { traces })
    }

    async fn emission_traces(&self, request: ChartRequest) -> AppResult<ChartResponse> {
        let (from, to) = request.window(Utc::now())?;
        let energy = self.uow.energy();

        let mut traces = Vec::new();
        for name in &request.buildings {
            let Some(building) = energy.find_building(name).await? else {
                continue;
            };
            let mut readings = Vec::new();
            for category in request.energy_type.categories() {
                readings.extend(energy.readings(building.id, category, from, to).await?);
            }
            traces.push(emissions_trace(&building.name, &readings));
        }
        Ok(ChartResponse { traces })
    }

    async fn dashboard(&self) -> AppResult<EnergyDashboard> {
        let energy = self.uow.energy();
        let (buildings, electricity, gas) = try_join!(
            energy.building_names(),
            energy.usage_by_zone(EnergyCategory::Electricity),
            energy.usage_by_zone(EnergyCategory::Gas),
        )?;

        Ok(EnergyDashboard {
            buildings,
            electricity_usage: zone_series(electricity),
            gas_usage: zone_series(gas),
        })
    }

    async fn ingest(&self, batch: Vec<(EnergyCategory, SensorPayload)>) -> AppResult<u64> {
        let energy = self.uow.energy();
        let mut ids: HashMap<String, Uuid> = HashMap::new();
        let mut readings = Vec::with_capacity(batch.len());

        for (category, payload) in batch {
            let building_id = match ids.get(&payload.building) {
                Some(id) => *id,
                None => {
                    let building = energy
                        .ensure_building(&payload.building, &payload.building_code, &payload.zone)
                        .await?;
                    ids.insert(payload.building.clone(), building.id);
                    building.id
                }
            };
            readings.push(EnergyReading {
                id: Uuid::new_v4(),
                building_id,
                timestamp: payload.timestamp,
                category,
                value: payload.value,
            });
        }

        let written = energy.insert_readings(readings).await?;
        tracing::debug!(written, "Ingested sensor batch");
        Ok(written)
    }
}
