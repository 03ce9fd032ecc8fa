//! Vendor inventory and shopper offers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::DEFAULT_EXPIRING_DAYS;
use crate::domain::{CategoryOffers, NewProduct, Product, ProductPatch};
use crate::errors::{AppError, AppResult};
use crate::types::NoContent;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExpiringQuery {
    /// Days ahead to include, default 3
    pub days: Option<i64>,
}

/// Routes for `/products`; the caller must be a vendor or admin.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
}

/// Routes for `/offers`.
pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route("/expiring", get(expiring_offers))
        .route("/:category", get(category_offers))
}

/// The caller's own listings, soonest expiry first
#[utoipa::path(
    get,
    path = "/products",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vendor's products", body = Vec<Product>),
        (status = 403, description = "Not a vendor")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.inventory_service.list_own(user.id).await?))
}

/// List a product, or add units to an existing listing of the same name
#[utoipa::path(
    post,
    path = "/products",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    request_body = NewProduct,
    responses(
        (status = 201, description = "Listing created or topped up", body = Product),
        (status = 400, description = "Validation error or invalid category"),
        (status = 403, description = "Not a vendor")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<NewProduct>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = state.inventory_service.add_product(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit a listing; the final price is recomputed
#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Updated listing", body = Product),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProductPatch>,
) -> AppResult<Json<Product>> {
    let product = state
        .inventory_service
        .update_product(user.id, user.role, id, payload)
        .await?;
    Ok(Json(product))
}

/// Remove a listing
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Inventory",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .inventory_service
        .delete_product(user.id, user.role, id)
        .await?;
    Ok(NoContent)
}

/// Discounted stock of one category with the caller's eco-point balance
#[utoipa::path(
    get,
    path = "/offers/{category}",
    tag = "Offers",
    security(("bearer_auth" = [])),
    params(("category" = String, Path, description = "Category code (f, b, d, m, s, r) or name")),
    responses(
        (status = 200, description = "Category offers", body = CategoryOffers),
        (status = 400, description = "Invalid category")
    )
)]
pub async fn category_offers(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(category): Path<String>,
) -> AppResult<Json<CategoryOffers>> {
    let offers = state
        .inventory_service
        .browse_category(user.id, &category)
        .await?;
    Ok(Json(offers))
}

/// Everything expiring between today and `days` from now
#[utoipa::path(
    get,
    path = "/offers/expiring",
    tag = "Offers",
    security(("bearer_auth" = [])),
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Products about to expire", body = Vec<Product>)
    )
)]
pub async fn expiring_offers(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRING_DAYS);
    if days < 0 {
        return Err(AppError::BadRequest("days cannot be negative".into()));
    }
    Ok(Json(state.inventory_service.expiring(days).await?))
}
