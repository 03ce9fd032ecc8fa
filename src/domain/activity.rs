//! Walking and cycling activity and the eco points it earns.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;
use uuid::Uuid;

use super::pricing::round_money;
use crate::config::{
    ELECTRICITY_UNITS_PER_POINT, MAX_KM_PER_DAY, MAX_STEPS_PER_DAY, POINTS_PER_KM_CYCLED,
    POINTS_PER_STEP, POUNDS_PER_POINT,
};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Walking,
    Cycling,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Walking => "walking",
            ActivityType::Cycling => "cycling",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walking" => Ok(ActivityType::Walking),
            "cycling" => Ok(ActivityType::Cycling),
            other => Err(AppError::validation(format!("Unknown activity type '{}'", other))),
        }
    }
}

/// One day of one activity for one user. Points are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_date: NaiveDate,
    pub activity_type: ActivityType,
    pub steps: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub distance_km: Option<Decimal>,
    #[schema(value_type = String)]
    pub eco_points: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Build a log, deriving its points from the measured quantity.
    pub fn record(user_id: Uuid, entry: NewActivity) -> AppResult<Self> {
        let eco_points = entry.eco_points()?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            activity_date: entry.activity_date,
            activity_type: entry.activity_type,
            steps: entry.steps,
            distance_km: entry.distance_km,
            eco_points,
            created_at: Utc::now(),
        })
    }
}

/// Submitted activity.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewActivity {
    pub activity_date: NaiveDate,
    pub activity_type: ActivityType,
    /// Required for walking
    #[validate(range(min = 0, max = 100000, message = "Steps must be between 0 and 100000"))]
    pub steps: Option<i32>,
    /// Kilometres; required for cycling
    #[schema(value_type = Option<String>)]
    pub distance_km: Option<Decimal>,
}

impl NewActivity {
    /// Activity can only be logged for today or earlier.
    pub fn ensure_not_after(&self, today: NaiveDate) -> AppResult<()> {
        if self.activity_date > today {
            return Err(AppError::validation("Activity cannot be logged for a future date"));
        }
        Ok(())
    }

    pub fn eco_points(&self) -> AppResult<Decimal> {
        let points = match self.activity_type {
            ActivityType::Walking => {
                let steps = self
                    .steps
                    .filter(|s| *s >= 0)
                    .ok_or_else(|| AppError::validation("Walking requires a non-negative step count"))?;
                if steps > MAX_STEPS_PER_DAY {
                    return Err(AppError::validation(format!(
                        "At most {} steps can be logged per day",
                        MAX_STEPS_PER_DAY
                    )));
                }
                Decimal::from(steps) * POINTS_PER_STEP
            }
            ActivityType::Cycling => {
                let distance = self
                    .distance_km
                    .filter(|d| !d.is_sign_negative())
                    .ok_or_else(|| AppError::validation("Cycling requires a non-negative distance"))?;
                if distance > MAX_KM_PER_DAY {
                    return Err(AppError::validation(format!(
                        "At most {} km can be logged per day",
                        MAX_KM_PER_DAY
                    )));
                }
                distance * POINTS_PER_KM_CYCLED
            }
        };
        Ok(round_money(points))
    }
}

/// Pound value of a number of points.
pub fn points_value(points: Decimal) -> Decimal {
    round_money(points * POUNDS_PER_POINT)
}

/// Electricity units a number of points is equivalent to.
pub fn electricity_units(points: Decimal) -> Decimal {
    round_money(points * ELECTRICITY_UNITS_PER_POINT)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WalkingPoint {
    pub date: NaiveDate,
    pub steps: i64,
    #[schema(value_type = String)]
    pub eco_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CyclingPoint {
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub distance_km: Decimal,
    #[schema(value_type = String)]
    pub eco_points: Decimal,
}

/// Campus-wide per-day averages
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyAverage {
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub steps: Decimal,
    #[schema(value_type = String)]
    pub distance_km: Decimal,
}

/// Split a user's logs into walking and cycling series ordered by date.
pub fn split_series(logs: &[ActivityLog]) -> (Vec<WalkingPoint>, Vec<CyclingPoint>) {
    let mut sorted: Vec<&ActivityLog> = logs.iter().collect();
    sorted.sort_by_key(|l| (l.activity_date, l.created_at));

    let mut walking = Vec::new();
    let mut cycling = Vec::new();
    for log in sorted {
        match log.activity_type {
            ActivityType::Walking => walking.push(WalkingPoint {
                date: log.activity_date,
                steps: i64::from(log.steps.unwrap_or(0)),
                eco_points: log.eco_points,
            }),
            ActivityType::Cycling => cycling.push(CyclingPoint {
                date: log.activity_date,
                distance_km: log.distance_km.unwrap_or(Decimal::ZERO),
                eco_points: log.eco_points,
            }),
        }
    }
    (walking, cycling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn walking_earns_a_thousandth_per_step() {
        let entry = NewActivity {
            activity_date: day(1),
            activity_type: ActivityType::Walking,
            steps: Some(8450),
            distance_km: None,
        };
        assert_eq!(entry.eco_points().unwrap(), dec!(8.45));
    }

    #[test]
    fn cycling_earns_half_a_point_per_km() {
        let entry = NewActivity {
            activity_date: day(1),
            activity_type: ActivityType::Cycling,
            steps: None,
            distance_km: Some(dec!(12.3)),
        };
        assert_eq!(entry.eco_points().unwrap(), dec!(6.15));
    }

    #[test]
    fn missing_measurement_is_rejected() {
        let entry = NewActivity {
            activity_date: day(1),
            activity_type: ActivityType::Cycling,
            steps: Some(100),
            distance_km: None,
        };
        assert!(entry.eco_points().is_err());
    }

    #[test]
    fn steps_above_the_daily_cap_are_rejected() {
        let mut entry = NewActivity {
            activity_date: day(1),
            activity_type: ActivityType::Walking,
            steps: Some(MAX_STEPS_PER_DAY),
            distance_km: None,
        };
        assert_eq!(entry.eco_points().unwrap(), dec!(100));
        assert!(entry.validate().is_ok());

        entry.steps = Some(MAX_STEPS_PER_DAY + 1);
        assert!(matches!(entry.eco_points(), Err(AppError::Validation(_))));
        assert!(entry.validate().is_err());
    }

    #[test]
    fn distance_above_the_daily_cap_is_rejected() {
        let mut entry = NewActivity {
            activity_date: day(1),
            activity_type: ActivityType::Cycling,
            steps: None,
            distance_km: Some(MAX_KM_PER_DAY),
        };
        assert_eq!(entry.eco_points().unwrap(), dec!(100));

        entry.distance_km = Some(dec!(100000000));
        assert!(matches!(entry.eco_points(), Err(AppError::Validation(_))));
        assert!(ActivityLog::record(Uuid::new_v4(), entry).is_err());
    }

    #[test]
    fn future_dates_are_rejected() {
        let entry = NewActivity {
            activity_date: day(10),
            activity_type: ActivityType::Walking,
            steps: Some(5000),
            distance_km: None,
        };
        assert!(entry.ensure_not_after(day(10)).is_ok());
        assert!(entry.ensure_not_after(day(11)).is_ok());
        assert!(matches!(entry.ensure_not_after(day(9)), Err(AppError::Validation(_))));
    }

    #[test]
    fn hundred_points_are_two_pounds() {
        assert_eq!(points_value(dec!(100)), dec!(2.00));
        assert_eq!(electricity_units(dec!(100)), dec!(37.00));
    }

    #[test]
    fn series_are_split_and_sorted() {
        let user = Uuid::new_v4();
        let logs = vec![
            ActivityLog::record(
                user,
                NewActivity {
                    activity_date: day(3),
                    activity_type: ActivityType::Walking,
                    steps: Some(5000),
                    distance_km: None,
                },
            )
            .unwrap(),
            ActivityLog::record(
                user,
                NewActivity {
                    activity_date: day(2),
                    activity_type: ActivityType::Cycling,
                    steps: None,
                    distance_km: Some(dec!(4)),
                },
            )
            .unwrap(),
            ActivityLog::record(
                user,
                NewActivity {
                    activity_date: day(1),
                    activity_type: ActivityType::Walking,
                    steps: Some(7000),
                    distance_km: None,
                },
            )
            .unwrap(),
        ];

        let (walking, cycling) = split_series(&logs);
        assert_eq!(walking.iter().map(|w| w.date).collect::<Vec<_>>(), vec![day(1), day(3)]);
        assert_eq!(cycling.len(), 1);
        assert_eq!(cycling[0].eco_points, dec!(2.00));
    }
}
