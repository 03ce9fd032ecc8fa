//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_BUILDINGS_FILE, DEFAULT_DATABASE_URL, DEFAULT_DIGEST_HOUR,
    DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_MAIL_FROM, DEFAULT_REDIS_URL, DEFAULT_SENSOR_BATCH_SIZE,
    DEFAULT_SENSOR_INTERVAL_SECS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH,
};
use crate::domain::FallbackDiscount;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub mail_from: String,
    /// Queue mail through the job worker instead of logging it inline
    pub mail_queue: bool,
    pub discount_fallback: FallbackDiscount,
    pub digest_hour: u32,
    pub sensor_interval_secs: u64,
    pub sensor_batch_size: usize,
    pub buildings_file: String,
    /// Backfill simulated activity on start and daily while serving
    pub enable_activity_simulator: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("mail_from", &self.mail_from)
            .field("mail_queue", &self.mail_queue)
            .field("discount_fallback", &self.discount_fallback)
            .field("digest_hour", &self.digest_hour)
            .field("sensor_interval_secs", &self.sensor_interval_secs)
            .field("sensor_batch_size", &self.sensor_batch_size)
            .field("buildings_file", &self.buildings_file)
            .field("enable_activity_simulator", &self.enable_activity_simulator)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short, or if
    /// DISCOUNT_FALLBACK / DIGEST_HOUR hold unusable values.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let discount_fallback = match env::var("DISCOUNT_FALLBACK") {
            Ok(value) => value
                .parse()
                .unwrap_or_else(|e| panic!("DISCOUNT_FALLBACK: {}", e)),
            Err(_) => FallbackDiscount::default(),
        };

        let digest_hour = parse_or("DIGEST_HOUR", DEFAULT_DIGEST_HOUR);
        if digest_hour > 23 {
            panic!("DIGEST_HOUR must be between 0 and 23, got {}", digest_hour);
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: parse_or("JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            mail_queue: parse_or("MAIL_QUEUE", false),
            discount_fallback,
            digest_hour,
            sensor_interval_secs: parse_or("SENSOR_INTERVAL_SECS", DEFAULT_SENSOR_INTERVAL_SECS),
            sensor_batch_size: parse_or("SENSOR_BATCH_SIZE", DEFAULT_SENSOR_BATCH_SIZE),
            buildings_file: env::var("BUILDINGS_FILE")
                .unwrap_or_else(|_| DEFAULT_BUILDINGS_FILE.to_string()),
            enable_activity_simulator: parse_or("ENABLE_ACTIVITY_SIMULATOR", false),
        }
    }

    /// Configuration for tests and tooling that never touch the environment.
    pub fn for_testing() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: "test-secret-key-minimum-32-characters".to_string(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            mail_queue: false,
            discount_fallback: FallbackDiscount::default(),
            digest_hour: DEFAULT_DIGEST_HOUR,
            sensor_interval_secs: DEFAULT_SENSOR_INTERVAL_SECS,
            sensor_batch_size: DEFAULT_SENSOR_BATCH_SIZE,
            buildings_file: DEFAULT_BUILDINGS_FILE.to_string(),
            enable_activity_simulator: false,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
