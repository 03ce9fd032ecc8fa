//! Redemption ledger entries.

use sea_orm::entity::prelude::*;

use crate::domain::{Debit, Redemption};
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "redemptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub value: Decimal,
    #[sea_orm(unique)]
    pub voucher_code: String,
    /// `[{log_id, points}]`
    pub debits: Json,
    pub issued_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
    pub claimed_at: Option<DateTimeUtc>,
    pub claimed_by: Option<Uuid>,
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

impl TryFrom<Model> for Redemption {
    type Error = AppError;

    fn try_from(model: Model) -> AppResult<Self> {
        let debits: Vec<Debit> = serde_json::from_value(model.debits)
            .map_err(|e| AppError::internal(format!("Corrupt debits on redemption {}: {}", model.id, e)))?;
        Ok(Redemption {
            id: model.id,
            user_id: model.user_id,
            points: model.points,
            value: model.value,
            voucher_code: model.voucher_code,
            debits,
            issued_at: model.issued_at,
            expires_at: model.expires_at,
            claimed_at: model.claimed_at,
            claimed_by: model.claimed_by,
        })
    }
}

impl TryFrom<&Redemption> for ActiveModel {
    type Error = AppError;

    fn try_from(r: &Redemption) -> AppResult<Self> {
        use sea_orm::Set;

        let debits = serde_json::to_value(&r.debits)
            .map_err(|e| AppError::internal(format!("Failed to encode debits: {}", e)))?;
        Ok(ActiveModel {
            id: Set(r.id),
            user_id: Set(r.user_id),
            points: Set(r.points),
            value: Set(r.value),
            voucher_code: Set(r.voucher_code.clone()),
            debits: Set(debits),
            issued_at: Set(r.issued_at),
            expires_at: Set(r.expires_at),
            claimed_at: Set(r.claimed_at),
            claimed_by: Set(r.claimed_by),
        })
    }
}

pub(crate) fn into_redemptions(models: Vec<Model>) -> AppResult<Vec<Redemption>> {
    models.into_iter().map(Redemption::try_from).collect()
}
