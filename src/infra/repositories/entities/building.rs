//! Campus buildings and accommodation flats.

use sea_orm::entity::prelude::*;

use crate::domain::Building;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub code: String,
    pub zone: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::energy_reading::Entity")]
    Readings,
}

impl Related<super::energy_reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Building {
    fn from(model: Model) -> Self {
        Building {
            id: model.id,
            name: model.name,
            code: model.code,
            zone: model.zone,
        }
    }
}
