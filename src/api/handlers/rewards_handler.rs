//! Activity logging, eco-points and vouchers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_vendor, CurrentUser};
use crate::api::AppState;
use crate::domain::{ActivityLog, EcoPoints, NewActivity, Redemption, VoucherResponse};
use crate::errors::AppResult;
use crate::services::RewardsDashboard;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RedeemRequest {
    /// Whole points to spend, at least 10
    #[validate(range(min = 10, message = "At least 10 points must be redeemed"))]
    #[schema(example = 60)]
    pub points: i64,
}

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/", get(list_activities).post(log_activity))
}

pub fn rewards_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(balance))
        .route("/dashboard", get(dashboard))
        .route("/redemptions", get(list_redemptions))
        .route("/redeem", post(redeem))
        .route(
            "/vouchers/:code/claim",
            post(claim_voucher).route_layer(axum::middleware::from_fn(require_vendor)),
        )
}

/// The caller's activity history
#[utoipa::path(
    get,
    path = "/activities",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Activity logs", body = Vec<ActivityLog>))
)]
pub async fn list_activities(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ActivityLog>>> {
    Ok(Json(state.rewards_service.list_activities(user.id).await?))
}

/// Record a walk or a ride; points are fixed at creation
#[utoipa::path(
    post,
    path = "/activities",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    request_body = NewActivity,
    responses(
        (status = 201, description = "Activity logged", body = ActivityLog),
        (status = 400, description = "Missing steps or distance"),
        (status = 409, description = "Already logged for that day")
    )
)]
pub async fn log_activity(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<NewActivity>,
) -> AppResult<(StatusCode, Json<ActivityLog>)> {
    let log = state.rewards_service.log_activity(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

/// Eco-point balance and its pound value
#[utoipa::path(
    get,
    path = "/rewards",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Current balance", body = EcoPoints))
)]
pub async fn balance(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<EcoPoints>> {
    Ok(Json(state.rewards_service.balance(user.id).await?))
}

/// Activity series, campus averages and balance in one payload
#[utoipa::path(
    get,
    path = "/rewards/dashboard",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Rewards dashboard", body = RewardsDashboard))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<RewardsDashboard>> {
    Ok(Json(state.rewards_service.dashboard(user.id).await?))
}

/// Vouchers issued to the caller
#[utoipa::path(
    get,
    path = "/rewards/redemptions",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Redemption history", body = Vec<Redemption>))
)]
pub async fn list_redemptions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Redemption>>> {
    Ok(Json(state.rewards_service.list_redemptions(user.id).await?))
}

/// Spend points on a voucher, which is also emailed
#[utoipa::path(
    post,
    path = "/rewards/redeem",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    request_body = RedeemRequest,
    responses(
        (status = 201, description = "Voucher issued", body = VoucherResponse),
        (status = 400, description = "Below the minimum or above the balance")
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<RedeemRequest>,
) -> AppResult<(StatusCode, Json<VoucherResponse>)> {
    let voucher = state.rewards_service.redeem(user.id, payload.points).await?;
    Ok((StatusCode::CREATED, Json(voucher)))
}

/// Accept a voucher at the counter; each code works once
#[utoipa::path(
    post,
    path = "/rewards/vouchers/{code}/claim",
    tag = "Rewards",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Voucher code")),
    responses(
        (status = 200, description = "Voucher claimed", body = Redemption),
        (status = 400, description = "Voucher expired"),
        (status = 403, description = "Not a vendor"),
        (status = 404, description = "Unknown code"),
        (status = 409, description = "Already claimed")
    )
)]
pub async fn claim_voucher(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> AppResult<Json<Redemption>> {
    Ok(Json(state.rewards_service.claim_voucher(user.id, &code).await?))
}
