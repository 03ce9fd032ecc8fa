//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{UserResponse, UserRole};
use crate::errors::AppResult;
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "student@campus.ac.uk")]
    pub email: String,
    /// Minimum 8 characters
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// `normal` (default) or `vendor`
    #[serde(default)]
    pub role: UserRole,
}

/// Email plus the code that was mailed to it
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "student@campus.ac.uk")]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "student@campus.ac.uk")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "student@campus.ac.uk")]
    pub email: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify", post(verify))
        .route("/resend", post(resend))
        .route("/login", post(login))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", post(reset_password))
}

/// Register an account and email its verification code
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, verification code sent", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth_service
        .signup(payload.email, payload.password, payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Confirm the signup code
#[utoipa::path(
    post,
    path = "/auth/verify",
    tag = "Authentication",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Email verified", body = UserResponse),
        (status = 400, description = "Invalid or expired code")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .auth_service
        .verify_email(&payload.email, &payload.code)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Send a fresh verification code
#[utoipa::path(
    post,
    path = "/auth/resend",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 404, description = "No unverified account with that email")
    )
)]
pub async fn resend(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.resend_code(&payload.email).await?;
    Ok(Json(MessageResponse::new("Verification code sent")))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 403, description = "Email not verified")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(token))
}

/// Email a password reset code
#[utoipa::path(
    post,
    path = "/auth/password/forgot",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "No verified account with that email")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<EmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new("Password reset code sent")))
}

/// Set a new password with the emailed code
#[utoipa::path(
    post,
    path = "/auth/password/reset",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired code")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth_service
        .reset_password(&payload.email, &payload.code, payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}
