//! One-time numeric codes for email verification and password reset.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{OTP_LENGTH, OTP_TTL_MINUTES};

/// A numeric code stored on the user record with its expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeCode {
    code: String,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneTimeCode")
            .field("code", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl OneTimeCode {
    pub fn new(code: String, expires_at: DateTime<Utc>) -> Self {
        Self { code, expires_at }
    }

    /// Draw a fresh zero-padded code valid for the configured TTL.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let code: String = (0..OTP_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self::new(code, now + Duration::minutes(OTP_TTL_MINUTES))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.code == candidate.trim()
    }
}
