//! Profile and password management for the signed-in user.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::AccountResponse;
use crate::errors::AppResult;
use crate::types::MessageResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_account))
        .route("/password", post(change_password))
}

/// Profile of the signed-in user
#[utoipa::path(
    get,
    path = "/account",
    tag = "Account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_account(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<AccountResponse>> {
    Ok(Json(state.auth_service.account(user.id).await?))
}

/// Change password, confirming the current one
#[utoipa::path(
    post,
    path = "/account/password",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is wrong")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth_service
        .change_password(user.id, payload.current_password, payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed")))
}
