//! Site configuration read from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

use crate::unlock::{LockPolicy, UnlockError};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub lock_policy: LockPolicy,
    pub sheet_url: Option<String>,
    pub items_csv: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub http_timeout_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lock_policy: LockPolicy::default(),
            sheet_url: None,
            items_csv: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChoice {
    Sheet,
    Csv,
    Demo,
}

impl SiteConfig {
    pub fn source_choice(&self) -> SourceChoice {
        if self.sheet_url.is_some() {
            SourceChoice::Sheet
        } else if self.items_csv.is_some() {
            SourceChoice::Csv
        } else {
            SourceChoice::Demo
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid lock days '{0}'")]
    InvalidLockDays(String),
    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),
    #[error("invalid bind address '{0}'")]
    InvalidAddr(String),
    #[error("invalid timeout '{0}'")]
    InvalidTimeout(String),
    #[error(transparent)]
    Policy(#[from] UnlockError),
}

pub fn site_config_from_env() -> SiteConfig {
    let mut config = SiteConfig::default();

    let lock_days = env_value("COAH_LOCK_DAYS")
        .map(|raw| parse_lock_days(&raw))
        .transpose()
        .unwrap_or_else(|err| fallback(err, None));
    let time_zone = env_value("COAH_TIME_ZONE")
        .map(|raw| parse_time_zone(&raw))
        .transpose()
        .unwrap_or_else(|err| fallback(err, None));

    let lock_days = lock_days.unwrap_or(config.lock_policy.lock_days);
    let time_zone = time_zone.unwrap_or(config.lock_policy.time_zone);
    config.lock_policy = LockPolicy::new(lock_days, time_zone)
        .unwrap_or_else(|err| fallback(err.into(), LockPolicy::default()));

    config.sheet_url = env_value("COAH_SHEET_URL");
    config.items_csv = env_value("COAH_ITEMS_CSV").map(PathBuf::from);

    if let Some(raw) = env_value("COAH_ADDR") {
        let default_addr = config.bind_addr;
        config.bind_addr = raw
            .parse()
            .unwrap_or_else(|_| fallback(ConfigError::InvalidAddr(raw), default_addr));
    }

    if let Some(raw) = env_value("COAH_HTTP_TIMEOUT_MS") {
        config.http_timeout_ms = raw
            .parse::<u64>()
            .ok()
            .filter(|timeout| *timeout > 0)
            .unwrap_or_else(|| fallback(ConfigError::InvalidTimeout(raw), DEFAULT_HTTP_TIMEOUT_MS));
    }

    config
}

pub fn parse_lock_days(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ConfigError::InvalidLockDays(raw.to_string())),
    }
}

pub fn parse_time_zone(raw: &str) -> Result<Tz, ConfigError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimeZone(raw.to_string()))
}

/// Trimmed value of `key`; unset and blank are both `None`.
pub(crate) fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Reads an on/off switch such as `1`, `yes` or `off`.
pub(crate) fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn fallback<T>(err: ConfigError, default: T) -> T {
    warn!(
        component = "config",
        event = "config.invalid_value",
        error = %err
    );
    default
}
