//! Activity log table. Rows are append-only.

use sea_orm::entity::prelude::*;

use crate::domain::{ActivityLog, ActivityType};
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_date: Date,
    pub activity_type: String,
    pub steps: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((8, 2)))", nullable)]
    pub distance_km: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub eco_points: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ActivityLog {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        Ok(ActivityLog {
            id: model.id,
            user_id: model.user_id,
            activity_date: model.activity_date,
            activity_type: model.activity_type.parse::<ActivityType>()?,
            steps: model.steps,
            distance_km: model.distance_km,
            eco_points: model.eco_points,
            created_at: model.created_at,
        })
    }
}

impl From<&ActivityLog> for ActiveModel {
    fn from(log: &ActivityLog) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(log.id),
            user_id: Set(log.user_id),
            activity_date: Set(log.activity_date),
            activity_type: Set(log.activity_type.as_str().to_string()),
            steps: Set(log.steps),
            distance_km: Set(log.distance_km),
            eco_points: Set(log.eco_points),
            created_at: Set(log.created_at),
        }
    }
}

pub(crate) fn into_logs(models: Vec<Model>) -> AppResult<Vec<ActivityLog>> {
    models.into_iter().map(ActivityLog::try_from).collect()
}
