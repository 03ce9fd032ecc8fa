//! Activity log repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};
use uuid::Uuid;

use super::entities::activity_log::{self, into_logs, ActiveModel, Entity as ActivityEntity};
use crate::domain::{ActivityLog, ActivityType};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Per-day campus average of one measurement.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct DayAverage {
    pub activity_date: NaiveDate,
    pub average: Option<Decimal>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Append a log. One log per user, day and activity type.
    async fn insert(&self, log: ActivityLog) -> AppResult<ActivityLog>;

    /// A user's logs, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ActivityLog>>;

    async fn last_logged_date(&self, user_id: Uuid) -> AppResult<Option<NaiveDate>>;

    /// Average steps (walking) or distance (cycling) per day across all users
    async fn daily_averages(&self, activity_type: ActivityType) -> AppResult<Vec<DayAverage>>;
}

pub struct ActivityStore {
    db: DatabaseConnection,
}

impl ActivityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityRepository for ActivityStore {
    async fn insert(&self, log: ActivityLog) -> AppResult<ActivityLog> {
        let model = ActiveModel::from(&log)
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(format!(
                    "{} already logged for {}",
                    log.activity_type.as_str(),
                    log.activity_date
                )),
                _ => AppError::from(e),
            })?;
        ActivityLog::try_from(model)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ActivityLog>> {
        let models = ActivityEntity::find()
            .filter(activity_log::Column::UserId.eq(user_id))
            .order_by_asc(activity_log::Column::ActivityDate)
            .order_by_asc(activity_log::Column::CreatedAt)
            .all(&self.db)
            .await?;
        into_logs(models)
    }

    async fn last_logged_date(&self, user_id: Uuid) -> AppResult<Option<NaiveDate>> {
        let latest = ActivityEntity::find()
            .filter(activity_log::Column::UserId.eq(user_id))
            .order_by_desc(activity_log::Column::ActivityDate)
            .one(&self.db)
            .await?;
        Ok(latest.map(|m| m.activity_date))
    }

    async fn daily_averages(&self, activity_type: ActivityType) -> AppResult<Vec<DayAverage>> {
        let measured = match activity_type {
            ActivityType::Walking => activity_log::Column::Steps,
            ActivityType::Cycling => activity_log::Column::DistanceKm,
        };
        let rows = ActivityEntity::find()
            .select_only()
            .column(activity_log::Column::ActivityDate)
            .column_as(SimpleExpr::from(Func::avg(Expr::col(measured))), "average")
            .filter(activity_log::Column::ActivityType.eq(activity_type.as_str()))
            .group_by(activity_log::Column::ActivityDate)
            .order_by_asc(activity_log::Column::ActivityDate)
            .into_model::<DayAverage>()
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}
