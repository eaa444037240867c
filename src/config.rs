use crate::auth::session::SessionSettings;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tower_sessions::cookie::Key;
use tracing::info;
use tracing::warn;

const DEFAULT_SITE_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_IDLE_HOURS: i64 = 24;
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("SESSION_SECRET must be at least 64 bytes, got {0}")]
    SecretTooShort(usize),
}

/// Process settings read from the environment.
pub struct Config {
    pub site_addr: String,
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub session_key: Key,
    pub secure_cookies: bool,
    pub session_idle_hours: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session_key = match lookup("SESSION_SECRET") {
            Some(secret) if secret.len() < 64 => {
                return Err(ConfigError::SecretTooShort(secret.len()));
            }
            Some(secret) => Key::from(secret.as_bytes()),
            None => {
                warn!("SESSION_SECRET not set, sessions will not survive a restart");
                Key::generate()
            }
        };

        let session_idle_hours = parse_or(&lookup, "SESSION_IDLE_HOURS", DEFAULT_IDLE_HOURS)?;
        if session_idle_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_IDLE_HOURS",
                value: session_idle_hours.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !BCRYPT_COSTS.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: format!(
                    "must be between {} and {}",
                    BCRYPT_COSTS.start(),
                    BCRYPT_COSTS.end()
                ),
            });
        }

        Ok(Self {
            site_addr: lookup("SITE_ADDR").unwrap_or_else(|| DEFAULT_SITE_ADDR.to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            session_key,
            secure_cookies: parse_or(&lookup, "SECURE_COOKIES", false)?,
            session_idle_hours,
            bcrypt_cost,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            key: self.session_key.clone(),
            secure: self.secure_cookies,
            idle_timeout: time::Duration::hours(self.session_idle_hours),
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
