//! Inventory service - vendor listings, shopper offers and the daily
//! discount refresh.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use futures::try_join;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use super::rewards_service::ledger_from;
use super::today;
use crate::domain::{
    Category, CategoryOffers, EcoPoints, NewProduct, PricingEngine, Product, ProductPatch, UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// List a product, or top up units when the vendor already lists one
    /// with the same name.
    async fn add_product(&self, vendor_id: Uuid, input: NewProduct) -> AppResult<Product>;

    /// Owner or admin only. The final price is recomputed.
    async fn update_product(
        &self,
        actor_id: Uuid,
        role: UserRole,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> AppResult<Product>;

    async fn delete_product(&self, actor_id: Uuid, role: UserRole, product_id: Uuid) -> AppResult<()>;

    /// A vendor's products ordered by expiry.
    async fn list_own(&self, vendor_id: Uuid) -> AppResult<Vec<Product>>;

    /// In-stock, unexpired products of one category with the caller's balance.
    async fn browse_category(&self, user_id: Uuid, category: &str) -> AppResult<CategoryOffers>;

    /// Products expiring between today and `days` from now.
    async fn expiring(&self, days: i64) -> AppResult<Vec<Product>>;

    /// Reprice everything expiring within `days` and persist it.
    async fn refresh_discounts(&self, days: i64) -> AppResult<Vec<Product>>;
}

pub struct InventoryManager<U: UnitOfWork> {
    uow: Arc<U>,
    pricing: PricingEngine,
}

impl<U: UnitOfWork> InventoryManager<U> {
    pub fn new(uow: Arc<U>, pricing: PricingEngine) -> Self {
        Self { uow, pricing }
    }

    async fn owned(&self, actor_id: Uuid, role: UserRole, product_id: Uuid) -> AppResult<Product> {
        let product = self
            .uow
            .products()
            .find_by_id(product_id)
            .await?
            .ok_or_not_found()?;
        if product.vendor_id != actor_id && !role.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(product)
    }
}

fn validate_listing(input: &NewProduct) -> AppResult<Category> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if input.location.trim().is_empty() {
        return Err(AppError::validation("Location is required"));
    }
    if input.units < 1 {
        return Err(AppError::validation("Units must be at least 1"));
    }
    if input.marked_price < Decimal::ZERO {
        return Err(AppError::validation("Marked price cannot be negative"));
    }
    Category::parse(&input.category)
}

fn window(days: i64) -> AppResult<(NaiveDate, NaiveDate)> {
    if days < 0 {
        return Err(AppError::validation("days cannot be negative"));
    }
    let from = today();
    Ok((from, from + Duration::days(days)))
}

#[async_trait]
impl<U: UnitOfWork> InventoryService for InventoryManager<U> {
    async fn add_product(&self, vendor_id: Uuid, input: NewProduct) -> AppResult<Product> {
        let category = validate_listing(&input)?;
        let products = self.uow.products();
        let name = input.name.trim().to_string();

        if let Some(mut existing) = products.find_by_vendor_and_name(vendor_id, &name).await? {
            existing.units = existing
                .units
                .checked_add(input.units)
                .ok_or_else(|| AppError::validation("Too many units"))?;
            existing.reprice(&self.pricing, today())?;
            tracing::info!(product_id = %existing.id, units = existing.units, "Topped up listing");
            return products.update(existing).await;
        }

        let now = Utc::now();
        let mut product = Product {
            id: Uuid::new_v4(),
            vendor_id,
            name,
            category,
            expiry_date: input.expiry_date,
            units: input.units,
            marked_price: input.marked_price,
            discount: input.discount,
            final_price: input.marked_price,
            location: input.location.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        product.reprice(&self.pricing, today())?;

        let product = products.insert(product).await?;
        tracing::info!(product_id = %product.id, vendor_id = %vendor_id, "Listed product");
        Ok(product)
    }

    async fn update_product(
        &self,
        actor_id: Uuid,
        role: UserRole,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> AppResult<Product> {
        let mut product = self.owned(actor_id, role, product_id).await?;
        patch.apply(&mut product)?;
        if product.marked_price < Decimal::ZERO {
            return Err(AppError::validation("Marked price cannot be negative"));
        }
        product.reprice(&self.pricing, today())?;
        self.uow.products().update(product).await
    }

    async fn delete_product(&self, actor_id: Uuid, role: UserRole, product_id: Uuid) -> AppResult<()> {
        let product = self.owned(actor_id, role, product_id).await?;
        self.uow.products().delete(product.id).await?;
        tracing::info!(product_id = %product_id, "Deleted product");
        Ok(())
    }

    async fn list_own(&self, vendor_id: Uuid) -> AppResult<Vec<Product>> {
        self.uow.products().list_by_vendor(vendor_id).await
    }

    async fn browse_category(&self, user_id: Uuid, category: &str) -> AppResult<CategoryOffers> {
        let category = Category::parse(category)?;
        let (products, logs, redemptions) = (
            self.uow.products(),
            self.uow.activities(),
            self.uow.rewards(),
        );

        let (products, logs, redemptions) = try_join!(
            products.list_available(category, today()),
            logs.list_for_user(user_id),
            redemptions.list_for_user(user_id),
        )?;

        let points = EcoPoints::from_ledger(&ledger_from(&logs, &redemptions));
        let locations: BTreeSet<String> = products.iter().map(|p| p.location.clone()).collect();

        Ok(CategoryOffers {
            category,
            label: category.label().to_string(),
            products,
            locations: locations.into_iter().collect(),
            eco_points: points.total,
            eco_points_value: points.value,
        })
    }

    async fn expiring(&self, days: i64) -> AppResult<Vec<Product>> {
        let (from, to) = window(days)?;
        self.uow.products().list_expiring(from, to).await
    }

    async fn refresh_discounts(&self, days: i64) -> AppResult<Vec<Product>> {
        let (from, to) = window(days)?;
        let pricing = self.pricing;
        let refreshed = self
            .uow
            .reprice_window(from, to, Box::new(move |p: &mut Product| p.reprice(&pricing, from)))
            .await?;
        tracing::info!(count = refreshed.len(), days, "Refreshed discounts");
        Ok(refreshed)
    }
}
