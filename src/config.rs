use crate::error::{ExporterError, Result as ExporterResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub shelly: ShellyConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShellyConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub scheme: Scheme,
    /// Upper bound for each RPC call, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub verify_tls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Exporter identity, attached to every sample as the `job` label
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub disable_compression: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// IANA timezone used for log timestamps only
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ExporterError;

    fn from_str(s: &str) -> ExporterResult<Self> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ExporterError::Config(format!(
                "SHELLY_SCHEME must be 'http' or 'https', got '{}'",
                other
            ))),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8123
}

fn default_name() -> String {
    "shelly-exporter".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ShellyConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            scheme: Scheme::default(),
            timeout_seconds: default_timeout_seconds(),
            verify_tls: default_true(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            name: default_name(),
            disable_compression: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timezone: default_timezone(),
        }
    }
}

impl ShellyConfig {
    /// Base URL of the device RPC API, e.g. `http://192.168.1.50/rpc`
    pub fn rpc_endpoint(&self) -> String {
        format!("{}://{}/rpc", self.scheme, self.host.trim())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SHELLY_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Checks everything that must hold before the listener binds.
    pub fn validate(&self) -> ExporterResult<()> {
        if self.shelly.host.trim().is_empty() {
            return Err(ExporterError::Config(
                "SHELLY_HOST must be set and not empty".to_string(),
            ));
        }
        if self.shelly.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "Device timeout must be at least 1 second".to_string(),
            ));
        }
        if self.server.name.trim().is_empty() {
            return Err(ExporterError::Config(
                "SHELLY_EXPORTER_NAME must not be empty".to_string(),
            ));
        }
        crate::logging::parse_level(&self.logging.level)?;
        crate::logging::parse_timezone(&self.logging.timezone)?;
        Ok(())
    }
}
