//! Authentication service - signup with emailed one-time codes, login,
//! password recovery and the signed-in account view.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, OTP_TTL_MINUTES, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{AccountResponse, OneTimeCode, Password, User, UserResponse, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{EmailMessage, Mailer, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Argon2 hash that never verifies; keeps unknown-email logins as slow as real ones.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dummysalt123456$dummyhash1234567890123456789012";

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an unverified account and email its signup code.
    async fn signup(&self, email: String, password: String, role: UserRole) -> AppResult<User>;

    /// Confirm the signup code.
    async fn verify_email(&self, email: &str, code: &str) -> AppResult<User>;

    /// Issue a fresh signup code to an unverified account.
    async fn resend_code(&self, email: &str) -> AppResult<()>;

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Email a reset code to a verified account.
    async fn forgot_password(&self, email: &str) -> AppResult<()>;

    async fn reset_password(&self, email: &str, code: &str, new_password: String) -> AppResult<()>;

    async fn change_password(&self, user_id: Uuid, current: String, new: String) -> AppResult<()>;

    async fn account(&self, user_id: Uuid) -> AppResult<AccountResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_code() -> AppError {
    AppError::validation("Invalid or expired code")
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self { uow, mailer, config }
    }

    async fn send_signup_code(&self, user: &User, otp: &OneTimeCode) -> AppResult<()> {
        self.mailer
            .send(EmailMessage::text(
                &user.email,
                "Your Verification Code",
                format!(
                    "Your signup code is {}. It expires in {} minutes.",
                    otp.code(),
                    OTP_TTL_MINUTES
                ),
            ))
            .await
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn signup(&self, email: String, password: String, role: UserRole) -> AppResult<User> {
        if role.is_admin() {
            return Err(AppError::validation("Role must be normal or vendor"));
        }

        let email = normalize_email(&email);
        if self.uow.users().find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let mut user = User::new(Uuid::new_v4(), email, password_hash, role);
        let otp = OneTimeCode::generate(Utc::now());
        user.issue_otp(otp.clone());

        let user = self.uow.users().create(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Account created");

        // The account stands even if the mail hop fails; the code can be resent.
        if let Err(e) = self.send_signup_code(&user, &otp).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send signup code");
        }
        Ok(user)
    }

    async fn verify_email(&self, email: &str, code: &str) -> AppResult<User> {
        let users = self.uow.users();
        let mut user = users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid_code)?;

        if !user.consume_otp(code, Utc::now()) {
            return Err(invalid_code());
        }
        user.mark_verified();
        users.save(&user).await
    }

    async fn resend_code(&self, email: &str) -> AppResult<()> {
        let users = self.uow.users();
        let mut user = users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_not_found()?;
        if user.verified {
            return Err(AppError::conflict("Email already verified"));
        }

        let otp = OneTimeCode::generate(Utc::now());
        user.issue_otp(otp.clone());
        let user = users.save(&user).await?;
        self.send_signup_code(&user, &otp).await
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_email(&normalize_email(&email)).await?;

        // Verify against a dummy hash when the user is unknown so both paths cost the same.
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(hash).verify(&password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => return Err(AppError::InvalidCredentials),
        };
        if !user.verified {
            return Err(AppError::EmailNotVerified);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        generate_token(&user, &self.config)
    }

    async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let users = self.uow.users();
        let mut user = users
            .find_by_email(&normalize_email(email))
            .await?
            .filter(|u| u.verified)
            .ok_or_not_found()?;

        let otp = OneTimeCode::generate(Utc::now());
        user.issue_otp(otp.clone());
        let user = users.save(&user).await?;

        self.mailer
            .send(EmailMessage::text(
                &user.email,
                "Password reset OTP",
                format!("Your OTP is {} (valid {} min).", otp.code(), OTP_TTL_MINUTES),
            ))
            .await
    }

    async fn reset_password(&self, email: &str, code: &str, new_password: String) -> AppResult<()> {
        let users = self.uow.users();
        let mut user = users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid_code)?;

        if !user.consume_otp(code, Utc::now()) {
            return Err(invalid_code());
        }
        user.set_password_hash(Password::new(&new_password)?.into_string());
        users.save(&user).await?;
        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn change_password(&self, user_id: Uuid, current: String, new: String) -> AppResult<()> {
        let users = self.uow.users();
        let mut user = users.find_by_id(user_id).await?.ok_or_not_found()?;

        if !Password::from_hash(user.password_hash.clone()).verify(&current) {
            return Err(AppError::InvalidCredentials);
        }
        user.set_password_hash(Password::new(&new)?.into_string());
        users.save(&user).await?;
        Ok(())
    }

    async fn account(&self, user_id: Uuid) -> AppResult<AccountResponse> {
        let user = self.uow.users().find_by_id(user_id).await?.ok_or_not_found()?;
        let days_since_signup = user.days_since_signup(Utc::now());
        Ok(AccountResponse {
            user: UserResponse::from(user),
            days_since_signup,
        })
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockMailer, MockUnitOfWork, MockUserRepository, UserRepository};
    use mockall::predicate::eq;

    fn service(users: MockUserRepository, mailer: MockMailer) -> Authenticator<MockUnitOfWork> {
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let mut uow = MockUnitOfWork::new();
        uow.expect_users().returning(move || users.clone());
        Authenticator::new(Arc::new(uow), Arc::new(mailer), Config::for_testing())
    }

    fn stored(email: &str, password: &str, verified: bool) -> User {
        let hash = Password::new(password).unwrap().into_string();
        let mut user = User::new(Uuid::new_v4(), email.into(), hash, UserRole::Normal);
        user.verified = verified;
        user
    }

    #[tokio::test]
    async fn signup_rejects_taken_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("taken@campus.ac.uk"))
            .returning(|e| Ok(Some(stored(e, "password123", true))));

        let err = service(users, MockMailer::new())
            .signup("Taken@Campus.ac.uk ".into(), "password123".into(), UserRole::Normal)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(m) if m == "Email already registered"));
    }

    #[tokio::test]
    async fn signup_mails_the_code() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(Ok);
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|m| m.text.starts_with("Your signup code is ") && m.text.ends_with("It expires in 10 minutes."))
            .times(1)
            .returning(|_| Ok(()));

        let user = service(users, mailer)
            .signup("new@campus.ac.uk".into(), "password123".into(), UserRole::Vendor)
            .await
            .unwrap();
        assert!(!user.verified);
        assert_eq!(user.role, UserRole::Vendor);
        assert!(user.otp.is_some());
    }

    #[tokio::test]
    async fn admins_cannot_self_register() {
        let err = service(MockUserRepository::new(), MockMailer::new())
            .signup("a@campus.ac.uk".into(), "password123".into(), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unverified_login_gets_no_token() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|e| Ok(Some(stored(e, "password123", false))));

        let err = service(users, MockMailer::new())
            .login("u@campus.ac.uk".into(), "password123".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailNotVerified));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .with(eq("u@campus.ac.uk"))
            .returning(|e| Ok(Some(stored(e, "password123", true))));
        users
            .expect_find_by_email()
            .with(eq("ghost@campus.ac.uk"))
            .returning(|_| Ok(None));
        let svc = service(users, MockMailer::new());

        let wrong = svc.login("u@campus.ac.uk".into(), "nope-nope".into()).await;
        let ghost = svc.login("ghost@campus.ac.uk".into(), "password123".into()).await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
        assert!(matches!(ghost, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn verified_login_issues_a_bearer_token() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|e| Ok(Some(stored(e, "password123", true))));
        let svc = service(users, MockMailer::new());

        let token = svc
            .login("u@campus.ac.uk".into(), "password123".into())
            .await
            .unwrap();
        assert_eq!(token.token_type, "Bearer");
        let claims = svc.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.email, "u@campus.ac.uk");
        assert_eq!(claims.role, "normal");
    }

    #[tokio::test]
    async fn forgot_password_requires_a_verified_account() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|e| Ok(Some(stored(e, "password123", false))));

        let err = service(users, MockMailer::new())
            .forgot_password("u@campus.ac.uk")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
