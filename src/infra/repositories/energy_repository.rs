//! Buildings and meter readings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::building::{self, Entity as BuildingEntity};
use super::entities::energy_reading::{self, Entity as ReadingEntity};
use crate::domain::{Building, EnergyCategory, EnergyReading};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EnergyRepository: Send + Sync {
    async fn find_building(&self, name: &str) -> AppResult<Option<Building>>;

    /// Look a building up by name, creating it on first sight.
    async fn ensure_building(&self, name: &str, code: &str, zone: &str) -> AppResult<Building>;

    /// Bulk insert; returns the number of rows written
    async fn insert_readings(&self, readings: Vec<EnergyReading>) -> AppResult<u64>;

    /// Readings in `[from, to]`, oldest first
    async fn readings(
        &self,
        building_id: Uuid,
        category: EnergyCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<EnergyReading>>;

    /// Names of coded (non-flat) buildings
    async fn building_names(&self) -> AppResult<Vec<String>>;

    /// Total usage per zone across coded buildings
    async fn usage_by_zone(&self, category: EnergyCategory) -> AppResult<Vec<(String, f64)>>;
}

pub struct EnergyStore {
    db: DatabaseConnection,
}

impl EnergyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EnergyRepository for EnergyStore {
    async fn find_building(&self, name: &str) -> AppResult<Option<Building>> {
        let model = BuildingEntity::find()
            .filter(building::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(model.map(Building::from))
    }

    async fn ensure_building(&self, name: &str, code: &str, zone: &str) -> AppResult<Building> {
        if let Some(existing) = self.find_building(name).await? {
            return Ok(existing);
        }

        let inserted = building::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
            zone: Set(zone.to_string()),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(model) => Ok(Building::from(model)),
            // Lost a race with another writer; theirs is as good as ours.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find_building(name)
                .await?
                .ok_or_else(|| AppError::internal(format!("building '{}' vanished", name))),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_readings(&self, readings: Vec<EnergyReading>) -> AppResult<u64> {
        if readings.is_empty() {
            return Ok(0);
        }
        let count = readings.len() as u64;
        let models: Vec<energy_reading::ActiveModel> =
            readings.iter().map(energy_reading::ActiveModel::from).collect();
        ReadingEntity::insert_many(models).exec(&self.db).await?;
        Ok(count)
    }

    async fn readings(
        &self,
        building_id: Uuid,
        category: EnergyCategory,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<EnergyReading>> {
        let models = ReadingEntity::find()
            .filter(energy_reading::Column::BuildingId.eq(building_id))
            .filter(energy_reading::Column::Category.eq(category.as_str()))
            .filter(energy_reading::Column::Timestamp.between(from, to))
            .order_by_asc(energy_reading::Column::Timestamp)
            .all(&self.db)
            .await?;
        models.into_iter().map(EnergyReading::try_from).collect()
    }

    async fn building_names(&self) -> AppResult<Vec<String>> {
        let names = BuildingEntity::find()
            .select_only()
            .column(building::Column::Name)
            .filter(building::Column::Code.ne(""))
            .order_by_asc(building::Column::Name)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(names)
    }

    async fn usage_by_zone(&self, category: EnergyCategory) -> AppResult<Vec<(String, f64)>> {
        let rows = ReadingEntity::find()
            .select_only()
            .column(building::Column::Zone)
            .column_as(
                SimpleExpr::from(Func::sum(Expr::col((
                    energy_reading::Entity,
                    energy_reading::Column::Value,
                )))),
                "total",
            )
            .join(JoinType::InnerJoin, energy_reading::Relation::Building.def())
            .filter(energy_reading::Column::Category.eq(category.as_str()))
            .filter(building::Column::Code.ne(""))
            .group_by(building::Column::Zone)
            .order_by_asc(building::Column::Zone)
            .into_tuple::<(String, f64)>()
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}
