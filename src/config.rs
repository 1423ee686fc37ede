// src/config.rs

use std::{env, fmt};

use dotenvy::dotenv;

use crate::utils::phone::is_valid_phone;

/// Number of questions served per attempt in hard mode.
pub const HARD_MODE_QUESTION_COUNT: usize = 30;

/// Points a user must accumulate to advance one level.
pub const POINTS_PER_LEVEL: i32 = 100;

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Shortest accepted signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 16;

const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub port: u16,
    pub db_max_connections: u32,
    pub rust_log: String,
    pub log_dir: String,
    /// Phone of the seeded administrator. Only honored together with `admin_password`.
    pub admin_phone: Option<String>,
    pub admin_password: Option<String>,
}

/// Startup configuration problems. The server refuses to start on any of these.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Loads `.env` (if present) and reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds and validates a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes long", MIN_JWT_SECRET_LEN),
            });
        }

        let jwt_expiration = match non_empty("JWT_EXPIRATION") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_EXPIRATION",
                        reason: format!("expected a positive number of seconds, got '{}'", raw),
                    });
                }
            },
            None => DEFAULT_JWT_EXPIRATION,
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got '{}'", raw),
                    });
                }
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let rust_log = non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let log_dir = non_empty("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        let admin_phone = non_empty("ADMIN_PHONE").map(|p| p.trim().to_string());
        if let Some(phone) = &admin_phone {
            if !is_valid_phone(phone) {
                return Err(ConfigError::Invalid {
                    key: "ADMIN_PHONE",
                    reason: format!("'{}' is not 11 digits starting with 0", phone),
                });
            }
        }
        let admin_password = non_empty("ADMIN_PASSWORD");

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            port,
            db_max_connections,
            rust_log,
            log_dir,
            admin_phone,
            admin_password,
        })
    }

    /// Administrator phone and password, or `None` unless both are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_phone, &self.admin_password) {
            (Some(phone), Some(password)) => Some((phone.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// True when `phone` belongs to the configured administrator.
    pub fn is_admin_phone(&self, phone: &str) -> bool {
        self.admin_credentials().is_some_and(|(admin, _)| admin == phone)
    }

    /// Role embedded in tokens issued to the holder of `phone`.
    pub fn role_for_phone(&self, phone: &str) -> &'static str {
        if self.is_admin_phone(phone) { "admin" } else { "user" }
    }
}
