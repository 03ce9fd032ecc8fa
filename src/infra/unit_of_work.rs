//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and owns the two workflows that must be
//! atomic: redeeming eco points against the ledger and repricing a window
//! of inventory.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::entities::{activity_log, product, redemption};
use super::repositories::{
    ActivityRepository, ActivityStore, EnergyRepository, EnergyStore, ProductRepository,
    ProductStore, RewardRepository, RewardStore, UserRepository, UserStore,
};
use crate::domain::{Debit, Ledger, Product, Redemption};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Issues a redemption from the caller's current ledger.
pub type RedemptionPlan = Box<dyn FnOnce(&Ledger) -> AppResult<Redemption> + Send>;

/// Rewrites the pricing fields of one product.
pub type Repricer = Box<dyn Fn(&mut Product) -> AppResult<()> + Send + Sync>;

type TxFuture<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn products(&self) -> Arc<dyn ProductRepository>;

    fn activities(&self) -> Arc<dyn ActivityRepository>;

    fn rewards(&self) -> Arc<dyn RewardRepository>;

    fn energy(&self) -> Arc<dyn EnergyRepository>;

    /// Build `user_id`'s ledger, let `plan` issue a redemption against it and
    /// persist the result. Runs serializable so concurrent redemptions cannot
    /// spend the same points twice.
    async fn redeem(&self, user_id: Uuid, plan: RedemptionPlan) -> AppResult<Redemption>;

    /// Apply `reprice` to every product expiring in `[from, to]` and save
    /// the changed rows in one transaction.
    async fn reprice_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        reprice: Repricer,
    ) -> AppResult<Vec<Product>>;
}

/// Queries bound to an open transaction.
struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    async fn ledger(&self, user_id: Uuid) -> AppResult<Ledger> {
        let logs = activity_log::Entity::find()
            .filter(activity_log::Column::UserId.eq(user_id))
            .order_by_asc(activity_log::Column::ActivityDate)
            .all(self.txn)
            .await?;
        let logs = activity_log::into_logs(logs)?;

        let redemptions = redemption::Entity::find()
            .filter(redemption::Column::UserId.eq(user_id))
            .all(self.txn)
            .await?;
        let redemptions = redemption::into_redemptions(redemptions)?;
        let debits: Vec<&Debit> = redemptions.iter().flat_map(|r| r.debits.iter()).collect();

        Ok(Ledger::new(&logs, debits))
    }

    async fn insert_redemption(&self, entry: &Redemption) -> AppResult<Redemption> {
        let model = redemption::ActiveModel::try_from(entry)?
            .insert(self.txn)
            .await?;
        Redemption::try_from(model)
    }

    async fn expiring(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(product::Column::ExpiryDate.between(from, to))
            .order_by_asc(product::Column::ExpiryDate)
            .all(self.txn)
            .await?;
        product::into_products(models)
    }

    async fn save_product(&self, item: &Product) -> AppResult<Product> {
        let model = product::ActiveModel::from(item).update(self.txn).await?;
        Product::try_from(model)
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    product_repo: Arc<ProductStore>,
    activity_repo: Arc<ActivityStore>,
    reward_repo: Arc<RewardStore>,
    energy_repo: Arc<EnergyStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            product_repo: Arc::new(ProductStore::new(db.clone())),
            activity_repo: Arc::new(ActivityStore::new(db.clone())),
            reward_repo: Arc::new(RewardStore::new(db.clone())),
            energy_repo: Arc::new(EnergyStore::new(db.clone())),
            db,
        }
    }

    /// Run `f` inside a transaction, committing on success and rolling back
    /// on error.
    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.product_repo.clone()
    }

    fn activities(&self) -> Arc<dyn ActivityRepository> {
        self.activity_repo.clone()
    }

    fn rewards(&self) -> Arc<dyn RewardRepository> {
        self.reward_repo.clone()
    }

    fn energy(&self) -> Arc<dyn EnergyRepository> {
        self.energy_repo.clone()
    }

    async fn redeem(&self, user_id: Uuid, plan: RedemptionPlan) -> AppResult<Redemption> {
        self.execute_transaction(IsolationLevel::Serializable, move |ctx| {
            Box::pin(async move {
                let ledger = ctx.ledger(user_id).await?;
                let issued = plan(&ledger)?;
                ctx.insert_redemption(&issued).await
            })
        })
        .await
    }

    async fn reprice_window(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        reprice: Repricer,
    ) -> AppResult<Vec<Product>> {
        self.execute_transaction(IsolationLevel::ReadCommitted, move |ctx| {
            Box::pin(async move {
                let mut saved = Vec::new();
                for mut item in ctx.expiring(from, to).await? {
                    let before = item.final_price;
                    reprice(&mut item)?;
                    if item.final_price != before {
                        saved.push(ctx.save_product(&item).await?);
                    } else {
                        saved.push(item);
                    }
                }
                Ok(saved)
            })
        })
        .await
    }
}
