//! Redemption ledger repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::entities::redemption::{self, into_redemptions, Entity as RedemptionEntity};
use crate::domain::Redemption;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RewardRepository: Send + Sync {
    /// A user's redemptions, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Redemption>>;

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Redemption>>;

    /// Record the claim on `redemption`. Fails with a conflict if another
    /// claim landed first.
    async fn mark_claimed(&self, redemption: &Redemption) -> AppResult<()>;
}

pub struct RewardStore {
    db: DatabaseConnection,
}

impl RewardStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RewardRepository for RewardStore {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Redemption>> {
        let models = RedemptionEntity::find()
            .filter(redemption::Column::UserId.eq(user_id))
            .order_by_asc(redemption::Column::IssuedAt)
            .all(&self.db)
            .await?;
        into_redemptions(models)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Redemption>> {
        RedemptionEntity::find()
            .filter(redemption::Column::VoucherCode.eq(code.trim().to_uppercase()))
            .one(&self.db)
            .await?
            .map(Redemption::try_from)
            .transpose()
    }

    async fn mark_claimed(&self, redemption: &Redemption) -> AppResult<()> {
        let result = RedemptionEntity::update_many()
            .col_expr(redemption::Column::ClaimedAt, Expr::value(redemption.claimed_at))
            .col_expr(redemption::Column::ClaimedBy, Expr::value(redemption.claimed_by))
            .filter(redemption::Column::Id.eq(redemption.id))
            .filter(redemption::Column::ClaimedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::conflict("Voucher has already been claimed"));
        }
        Ok(())
    }
}
