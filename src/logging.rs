//! Logging setup
//!
//! Installs a `tracing` subscriber whose timestamps are rendered in a
//! configurable IANA timezone (`%d/%m/%Y %H:%M:%S`). `RUST_LOG`, when set,
//! takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::error::{ExporterError, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::fmt;
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Resolved logging settings
#[derive(Debug, Clone, Copy)]
pub struct LogSettings {
    pub level: Level,
    pub timezone: Tz,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            timezone: chrono_tz::Europe::Paris,
        }
    }
}

impl LogSettings {
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        Ok(Self {
            level: parse_level(&config.level)?,
            timezone: parse_timezone(&config.timezone)?,
        })
    }
}

/// Parses a log level name, case-insensitively.
///
/// Accepts the `tracing` names plus `warning` and `critical`.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" | "critical" => Ok(Level::ERROR),
        _ => Err(ExporterError::Config(format!(
            "SHELLY_EXPORTER_LOGLEVEL invalid: '{}'",
            name
        ))),
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ExporterError::Config(format!("TZ invalid: '{}'", name)))
}

/// Timer rendering the current time in a fixed timezone
#[derive(Debug, Clone, Copy)]
pub struct ZonedTimer {
    timezone: Tz,
}

impl ZonedTimer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl FormatTime for ZonedTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = Utc::now().with_timezone(&self.timezone);
        write!(w, "{}", now.format(TIMESTAMP_FORMAT))
    }
}

/// Installs the global subscriber. Must be called at most once.
pub fn init(settings: LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(settings.level).into())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_timer(ZonedTimer::new(settings.timezone)))
        .init();
}
