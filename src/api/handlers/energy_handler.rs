//! Energy chart endpoints.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{ChartRequest, ChartResponse, EnergyDashboard};
use crate::errors::AppResult;

/// Chart routes mounted at the root; the dashboard lives under `/energy`.
pub fn energy_routes() -> Router<AppState> {
    Router::new()
        .route("/energy/dashboard", get(dashboard))
        .route("/get_energy_data", post(get_energy_data))
        .route("/get_co2_energy_data", post(get_co2_energy_data))
}

/// Building list and per-zone usage totals
#[utoipa::path(
    get,
    path = "/energy/dashboard",
    tag = "Energy",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Energy dashboard", body = EnergyDashboard))
)]
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<EnergyDashboard>> {
    Ok(Json(state.energy_service.dashboard().await?))
}

/// Raw usage lines per building and energy type
#[utoipa::path(
    post,
    path = "/get_energy_data",
    tag = "Energy",
    security(("bearer_auth" = [])),
    request_body = ChartRequest,
    responses(
        (status = 200, description = "One trace per building and type", body = ChartResponse),
        (status = 400, description = "Malformed dates")
    )
)]
pub async fn get_energy_data(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChartRequest>,
) -> AppResult<Json<ChartResponse>> {
    Ok(Json(state.energy_service.usage_traces(payload).await?))
}

/// Daily CO2 emission lines per building
#[utoipa::path(
    post,
    path = "/get_co2_energy_data",
    tag = "Energy",
    security(("bearer_auth" = [])),
    request_body = ChartRequest,
    responses(
        (status = 200, description = "One trace per building", body = ChartResponse),
        (status = 400, description = "Malformed dates")
    )
)]
pub async fn get_co2_energy_data(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChartRequest>,
) -> AppResult<Json<ChartResponse>> {
    Ok(Json(state.energy_service.emission_traces(payload).await?))
}
