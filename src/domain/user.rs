//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::otp::OneTimeCode;
use crate::config::{ROLE_ADMIN, ROLE_NORMAL, ROLE_VENDOR};

/// User roles enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Normal,
    Vendor,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Vendors manage inventory; admins may act on their behalf.
    pub fn can_sell(&self) -> bool {
        matches!(self, UserRole::Vendor | UserRole::Admin)
    }

    /// Check if this role can access a required role
    pub fn can_access(&self, required: &UserRole) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Vendor => matches!(required, UserRole::Vendor | UserRole::Normal),
            UserRole::Normal => matches!(required, UserRole::Normal),
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_VENDOR => UserRole::Vendor,
            _ => UserRole::Normal,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::Vendor => write!(f, "{}", ROLE_VENDOR),
            UserRole::Normal => write!(f, "{}", ROLE_NORMAL),
        }
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub verified: bool,
    #[serde(skip_serializing)]
    pub otp: Option<OneTimeCode>,
    /// Signup timestamp
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(id: Uuid, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            role,
            verified: false,
            otp: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whole days elapsed since signup.
    pub fn days_since_signup(&self, now: DateTime<Utc>) -> i64 {
        (now.date_naive() - self.created_at.date_naive()).num_days().max(0)
    }

    /// Attach a fresh one-time code.
    pub fn issue_otp(&mut self, otp: OneTimeCode) {
        self.otp = Some(otp);
        self.updated_at = Utc::now();
    }

    /// Consume the pending code if `code` matches and is still live.
    pub fn consume_otp(&mut self, code: &str, now: DateTime<Utc>) -> bool {
        let valid = self
            .otp
            .as_ref()
            .map(|otp| otp.matches(code, now))
            .unwrap_or(false);
        if valid {
            self.otp = None;
            self.updated_at = Utc::now();
        }
        valid
    }

    /// Mark the email address as verified
    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.updated_at = Utc::now();
    }

    /// Replace the stored password hash
    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.updated_at = Utc::now();
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "student@campus.ac.uk")]
    pub email: String,
    /// User role
    #[schema(example = "normal")]
    pub role: String,
    /// Whether the email address has been verified
    pub verified: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.to_string(),
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// Account overview returned to the signed-in user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Whole days since the account was created
    pub days_since_signup: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User::new(
            Uuid::new_v4(),
            "a@campus.ac.uk".into(),
            "hash".into(),
            UserRole::Normal,
        )
    }

    #[test]
    fn roles_round_trip_through_strings() {
        assert_eq!(UserRole::from("vendor"), UserRole::Vendor);
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("anything"), UserRole::Normal);
        assert_eq!(UserRole::Vendor.to_string(), "vendor");
    }

    #[test]
    fn vendor_access_excludes_admin_routes() {
        assert!(UserRole::Vendor.can_access(&UserRole::Vendor));
        assert!(!UserRole::Vendor.can_access(&UserRole::Admin));
        assert!(!UserRole::Normal.can_sell());
        assert!(UserRole::Admin.can_sell());
    }

    #[test]
    fn otp_is_single_use() {
        let now = Utc::now();
        let mut u = user();
        u.issue_otp(OneTimeCode::new("123456".into(), now + Duration::minutes(10)));

        assert!(!u.consume_otp("000000", now));
        assert!(u.consume_otp("123456", now));
        assert!(!u.consume_otp("123456", now));
    }

    #[test]
    fn expired_otp_is_rejected() {
        let now = Utc::now();
        let mut u = user();
        u.issue_otp(OneTimeCode::new("123456".into(), now - Duration::seconds(1)));
        assert!(!u.consume_otp("123456", now));
        assert!(u.otp.is_some());
    }

    #[test]
    fn days_since_signup_counts_calendar_days() {
        let mut u = user();
        u.created_at = Utc::now() - Duration::days(5);
        assert_eq!(u.days_since_signup(Utc::now()), 5);
    }
}
