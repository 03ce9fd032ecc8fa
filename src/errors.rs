//! One error type for every layer, rendered as
//! `{"error": {"code", "message", "details"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    /// Unknown email and wrong password look the same to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Please verify your email before logging in.")]
    EmailNotVerified,

    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Insufficient eco points: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: Decimal },

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl AppError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        use AppError::*;
        match self {
            Unauthorized => "UNAUTHORIZED",
            Forbidden => "FORBIDDEN",
            InvalidCredentials => "INVALID_CREDENTIALS",
            EmailNotVerified => "EMAIL_NOT_VERIFIED",
            NotFound => "NOT_FOUND",
            Conflict(_) => "CONFLICT",
            Validation(_) => "VALIDATION_ERROR",
            BadRequest(_) => "BAD_REQUEST",
            InvalidCategory(_) => "INVALID_CATEGORY",
            InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Database(_) => "DATABASE_ERROR",
            Jwt(_) => "AUTH_ERROR",
            Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Unauthorized | InvalidCredentials | Jwt(_) => StatusCode::UNAUTHORIZED,
            Forbidden | EmailNotVerified => StatusCode::FORBIDDEN,
            NotFound => StatusCode::NOT_FOUND,
            Conflict(_) => StatusCode::CONFLICT,
            Validation(_) | BadRequest(_) | InvalidCategory(_) | InsufficientPoints { .. } => {
                StatusCode::BAD_REQUEST
            }
            PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Database(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Server-side failures are logged here
    /// and replaced with a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!(error = ?e, "Database failure");
                "A database error occurred".to_string()
            }
            AppError::Jwt(e) => {
                tracing::debug!(error = ?e, "Rejected token");
                "Invalid or expired token".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "Internal failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::InsufficientPoints {
                requested,
                available,
            } => Some(json!({ "requested": requested, "available": available })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                message: self.user_message(),
                details: self.details(),
            },
        };
        (self.status(), Json(envelope)).into_response()
    }
}

/// `Option` to `NotFound`.
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unverified_login_is_forbidden_with_prompt() {
        let err = AppError::EmailNotVerified;
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.user_message(),
            "Please verify your email before logging in."
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = AppError::internal("connection refused at 10.0.0.3");
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn shortfall_carries_details() {
        let err = AppError::InsufficientPoints {
            requested: 50,
            available: dec!(12.5),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let details = err.details().unwrap();
        assert_eq!(details["requested"], 50);
        assert_eq!(details["available"], "12.5");
    }

    #[test]
    fn body_limit_maps_to_413() {
        assert_eq!(
            AppError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
