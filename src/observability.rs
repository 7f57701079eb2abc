//! Logging setup and the server lifecycle events.
//!
//! Every event carries a `component` and an `event` field so JSON output can
//! be filtered without parsing messages.

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{env_value, parse_switch, SiteConfig};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Subscriber settings taken from `COAH_LOG_LEVEL`, `COAH_LOG_FORMAT` and
/// `COAH_LOG_TARGET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `info` or `coah=debug`.
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Unset, blank or unrecognised values keep the defaults.
pub fn logging_config_from_env() -> LoggingConfig {
    let defaults = LoggingConfig::default();
    LoggingConfig {
        level: env_value("COAH_LOG_LEVEL").unwrap_or(defaults.level),
        format: env_value("COAH_LOG_FORMAT")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.format),
        include_target: env_value("COAH_LOG_TARGET")
            .and_then(|raw| parse_switch(&raw))
            .unwrap_or(defaults.include_target),
    }
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(fmt.with_ansi(false).json().finish())?
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(fmt.pretty().finish())?,
    }
    Ok(())
}

pub fn log_app_start(logging: &LoggingConfig, site: &SiteConfig) {
    info!(
        component = "inventory_server",
        event = "app.start",
        log_level = %logging.level,
        log_format = ?logging.format,
        lock_days = site.lock_policy.lock_days,
        time_zone = %site.lock_policy.time_zone.name()
    );
}

pub fn log_app_bind(bound_addr: SocketAddr) {
    info!(
        component = "inventory_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        route = "/"
    );
}

pub fn log_source_selected(source: &str, location: Option<&str>) {
    match location {
        Some(location) => info!(
            component = "inventory_server",
            event = "source.selected",
            source,
            location
        ),
        None => info!(
            component = "inventory_server",
            event = "source.selected",
            source
        ),
    }
}
