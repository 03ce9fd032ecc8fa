//! Inventory repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::entities::product::{self, into_products, ActiveModel, Entity as ProductEntity};
use crate::domain::{Category, Product};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// A vendor's listing with exactly this name
    async fn find_by_vendor_and_name(&self, vendor_id: Uuid, name: &str) -> AppResult<Option<Product>>;

    async fn insert(&self, product: Product) -> AppResult<Product>;

    async fn update(&self, product: Product) -> AppResult<Product>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// A vendor's listings, soonest expiry first
    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Product>>;

    /// In-stock listings of a category expiring on or after `from`
    async fn list_available(&self, category: Category, from: NaiveDate) -> AppResult<Vec<Product>>;

    /// Listings with `from <= expiry_date <= to`
    async fn list_expiring(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Product>>;
}

pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn find_by_vendor_and_name(&self, vendor_id: Uuid, name: &str) -> AppResult<Option<Product>> {
        ProductEntity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .filter(product::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn insert(&self, product: Product) -> AppResult<Product> {
        let model = ActiveModel::from(&product).insert(&self.db).await?;
        Product::try_from(model)
    }

    async fn update(&self, product: Product) -> AppResult<Product> {
        let model = ActiveModel::from(&product)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => AppError::NotFound,
                other => AppError::from(other),
            })?;
        Product::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ProductEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_by_vendor(&self, vendor_id: Uuid) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .filter(product::Column::VendorId.eq(vendor_id))
            .order_by_asc(product::Column::ExpiryDate)
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await?;
        into_products(models)
    }

    async fn list_available(&self, category: Category, from: NaiveDate) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .filter(product::Column::Category.eq(category.code().to_string()))
            .filter(product::Column::Units.gt(0))
            .filter(product::Column::ExpiryDate.gte(from))
            .order_by_asc(product::Column::ExpiryDate)
            .all(&self.db)
            .await?;
        into_products(models)
    }

    async fn list_expiring(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .filter(product::Column::ExpiryDate.between(from, to))
            .order_by_asc(product::Column::ExpiryDate)
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await?;
        into_products(models)
    }
}
