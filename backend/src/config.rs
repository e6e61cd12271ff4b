//! Runtime settings read from the environment at startup.

use log::{info, warn};
use std::{env, fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Invalid value for {key}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Maximum accepted request body, for both JSON rosters and CSV uploads.
    pub body_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load("GATECHECK_HOST", "127.0.0.1")?,
            port: try_load("GATECHECK_PORT", "8080")?,
            db_path: try_load("GATECHECK_DB_PATH", "gatecheck.sqlite")?,
            body_limit: try_load("GATECHECK_BODY_LIMIT", "10485760")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError {
            key,
            reason: e.to_string(),
        }
    })
}
