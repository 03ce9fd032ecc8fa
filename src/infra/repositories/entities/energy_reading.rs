//! Meter readings, one row per sensor message.

use sea_orm::entity::prelude::*;

use crate::domain::{EnergyCategory, EnergyReading};
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "energy_readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub building_id: Uuid,
    pub timestamp: DateTimeUtc,
    pub category: String,
    pub value: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::building::Entity",
        from = "Column::BuildingId",
        to = "super::building::Column::Id",
        on_delete = "Cascade"
    )]
    Building,
}

impl Related<super::building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for EnergyReading {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(EnergyReading {
            id: model.id,
            building_id: model.building_id,
            timestamp: model.timestamp,
            category: model.category.parse::<EnergyCategory>()?,
            value: model.value,
        })
    }
}

impl From<&EnergyReading> for ActiveModel {
    fn from(r: &EnergyReading) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(r.id),
            building_id: Set(r.building_id),
            timestamp: Set(r.timestamp),
            category: Set(r.category.as_str().to_string()),
            value: Set(r.value),
        }
    }
}
