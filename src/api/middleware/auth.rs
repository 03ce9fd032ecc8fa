//! Bearer-token authentication and role gates.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::UserRole;
use crate::errors::AppError;
use crate::services::Claims;

/// The caller, as established by `auth_middleware`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: UserRole::from(claims.role.as_str()),
            email: claims.email,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid JWT and stores the caller in the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = state.auth_service.verify_token(token)?;
    request.extensions_mut().insert(CurrentUser::from(claims));
    Ok(next.run(request).await)
}

/// Vendors and admins only: inventory management and voucher claims.
pub async fn require_vendor(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<CurrentUser>() {
        None => Err(AppError::Unauthorized),
        Some(user) if !user.role.can_sell() => Err(AppError::Forbidden),
        Some(_) => Ok(next.run(request).await),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens_only() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn claims_map_to_roles() {
        let user = CurrentUser::from(Claims {
            sub: Uuid::nil(),
            email: "cafe@campus.ac.uk".into(),
            role: "vendor".into(),
            exp: 0,
            iat: 0,
        });
        assert_eq!(user.role, UserRole::Vendor);
        assert!(user.role.can_sell());
    }
}
