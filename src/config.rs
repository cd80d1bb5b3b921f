use std::env;
use std::net::SocketAddr;
use thiserror::Error;

use crate::leaderboard::DEFAULT_PAGE_SIZE;
use crate::stats::service::DEFAULT_MAX_WRITE_ATTEMPTS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the service binary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub leaderboard_page_size: usize,
    /// Optimistic write attempts per stat update before giving up
    pub max_write_attempts: usize,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - Postgres URL (default: in-memory store)
    /// - `BIND_ADDR` - listen address (default: 0.0.0.0:3000)
    /// - `LEADERBOARD_PAGE_SIZE` - entries per leaderboard page (default: 10)
    /// - `STATS_MAX_WRITE_ATTEMPTS` - contended write attempts per stat update (default: 32)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: bind_addr.clone(),
                reason: err.to_string(),
            })?;

        let leaderboard_page_size =
            positive_or(&lookup, "LEADERBOARD_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_write_attempts =
            positive_or(&lookup, "STATS_MAX_WRITE_ATTEMPTS", DEFAULT_MAX_WRITE_ATTEMPTS)?;

        Ok(Self {
            database_url,
            bind_addr,
            leaderboard_page_size,
            max_write_attempts,
        })
    }
}

fn positive_or<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::Invalid {
                key,
                value: raw,
                reason: "expected a positive integer".to_string(),
            }),
        },
    }
}
