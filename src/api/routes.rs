//! Application route configuration.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    account_routes, activity_routes, auth_routes, energy_routes, offer_routes, product_routes,
    rewards_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, require_vendor};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::MAX_BODY_BYTES;
use crate::errors::AppError;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    // Everything below requires a valid bearer token
    let protected = Router::new()
        .nest("/account", account_routes())
        .nest(
            "/products",
            product_routes().route_layer(middleware::from_fn(require_vendor)),
        )
        .nest("/offers", offer_routes())
        .nest("/activities", activity_routes())
        .nest("/rewards", rewards_routes())
        .merge(energy_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(
            "/auth",
            auth_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_auth_middleware,
            )),
        )
        .merge(protected)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Green Campus API"
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

/// Individual service health status
#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    redis: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn from_check<E: ToString>(result: Option<Result<(), E>>) -> Self {
        match result {
            None => ServiceStatus {
                status: "not configured",
                error: None,
            },
            Some(Ok(())) => ServiceStatus {
                status: "healthy",
                error: None,
            },
            Some(Err(e)) => ServiceStatus {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

/// Health check endpoint with database and Redis connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_status = ServiceStatus::from_check(match &state.database {
        Some(db) => Some(db.ping().await),
        None => None,
    });

    let redis_status = ServiceStatus::from_check(match &state.cache {
        Some(cache) => Some(cache.ping().await),
        None => None,
    });

    let degraded = db_status.is_unhealthy() || redis_status.is_unhealthy();

    let response = HealthResponse {
        status: if degraded { "degraded" } else { "healthy" },
        services: ServiceHealth {
            database: db_status,
            redis: redis_status,
        },
    };

    let status_code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
