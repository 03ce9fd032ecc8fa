//! Buildings, meter readings and chart shaping.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;
use uuid::Uuid;

use crate::config::{CO2_FACTOR_ELECTRICITY, CO2_FACTOR_GAS, DEFAULT_ENERGY_WINDOW_DAYS};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnergyCategory {
    Electricity,
    Gas,
}

impl EnergyCategory {
    pub const ALL: [EnergyCategory; 2] = [EnergyCategory::Electricity, EnergyCategory::Gas];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyCategory::Electricity => "electricity",
            EnergyCategory::Gas => "gas",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EnergyCategory::Electricity => "Electricity",
            EnergyCategory::Gas => "Gas",
        }
    }

    /// kg CO2 per kWh
    pub fn co2_factor(&self) -> f64 {
        match self {
            EnergyCategory::Electricity => CO2_FACTOR_ELECTRICITY,
            EnergyCategory::Gas => CO2_FACTOR_GAS,
        }
    }
}

impl std::str::FromStr for EnergyCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electricity" => Ok(EnergyCategory::Electricity),
            "gas" => Ok(EnergyCategory::Gas),
            other => Err(AppError::BadRequest(format!("unknown energy category '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    /// Empty for individual accommodation flats
    pub code: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub id: Uuid,
    pub building_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub category: EnergyCategory,
    pub value: f64,
}

/// Message published by a meter on the sensor bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    pub timestamp: DateTime<Utc>,
    pub building: String,
    pub building_code: String,
    pub zone: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnergyTypeFilter {
    #[default]
    Both,
    Electricity,
    Gas,
}

impl EnergyTypeFilter {
    pub fn categories(&self) -> Vec<EnergyCategory> {
        match self {
            EnergyTypeFilter::Both => EnergyCategory::ALL.to_vec(),
            EnergyTypeFilter::Electricity => vec![EnergyCategory::Electricity],
            EnergyTypeFilter::Gas => vec![EnergyCategory::Gas],
        }
    }
}

/// Body of the chart endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ChartRequest {
    #[serde(default)]
    pub buildings: Vec<String>,
    #[serde(default)]
    pub energy_type: EnergyTypeFilter,
    /// `YYYY-MM-DD`
    #[schema(example = "2025-04-01")]
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    #[schema(example = "2025-04-30")]
    pub end_date: Option<String>,
}

impl ChartRequest {
    /// Resolve the requested window; defaults to the last 30 days.
    pub fn window(&self, now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                let start = parse_day(start)?;
                let end = parse_day(end)?;
                if end < start {
                    return Err(AppError::BadRequest("end_date is before start_date".into()));
                }
                Ok((
                    start.and_time(NaiveTime::MIN).and_utc(),
                    (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc()
                        - Duration::nanoseconds(1),
                ))
            }
            _ => Ok((now - Duration::days(DEFAULT_ENERGY_WINDOW_DAYS), now)),
        }
    }
}

fn parse_day(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// One chart line in the shape the dashboard's plotting library expects.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Trace {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub mode: String,
    pub name: String,
}

impl Trace {
    pub fn line(name: String, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            kind: "scatter".to_string(),
            mode: "lines".to_string(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartResponse {
    pub traces: Vec<Trace>,
}

/// Raw usage line for one building and category.
pub fn usage_trace(building: &str, category: EnergyCategory, readings: &[EnergyReading]) -> Trace {
    let mut sorted: Vec<&EnergyReading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);
    let (x, y) = sorted
        .into_iter()
        .map(|r| (r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(), r.value))
        .unzip();
    Trace::line(format!("{} - {}", building, category.title()), x, y)
}

/// Daily CO2 line for one building, summed across categories.
pub fn emissions_trace(building: &str, readings: &[EnergyReading]) -> Trace {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in readings {
        *per_day.entry(r.timestamp.date_naive()).or_default() += r.value * r.category.co2_factor();
    }
    let (x, y) = per_day
        .into_iter()
        .map(|(day, kg)| (day.format("%Y-%m-%d").to_string(), kg))
        .unzip();
    Trace::line(format!("{} - Total CO₂ Emissions", building), x, y)
}

/// Chart.js style series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LabelledSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl LabelledSeries {
    pub fn from_totals(totals: BTreeMap<String, f64>) -> Self {
        let (labels, data) = totals.into_iter().unzip();
        Self { labels, data }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EnergyDashboard {
    pub buildings: Vec<String>,
    pub electricity_usage: LabelledSeries,
    pub gas_usage: LabelledSeries,
}
