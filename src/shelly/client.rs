//! Shelly HTTP RPC Client
//!
//! Gen2+ Shelly devices expose their RPC API as plain HTTP GETs under
//! `/rpc/<Method>`, each answering with a JSON document.
//!
//! # Example
//!
//! ```no_run
//! use shelly_exporter::config::ShellyConfig;
//! use shelly_exporter::shelly::ShellyClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ShellyConfig {
//!     host: "192.168.1.50".to_string(),
//!     ..ShellyConfig::default()
//! };
//!
//! let client = ShellyClient::new(&config)?;
//! let snapshot = client.fetch_snapshot().await?;
//! println!("{}", snapshot.device_info);
//! # Ok(())
//! # }
//! ```

use crate::config::ShellyConfig;
use crate::error::{ExporterError, Result};
use crate::shelly::types::{DeviceSnapshot, RpcMethod};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Client for the Shelly RPC API
///
/// Wraps a pooled `reqwest::Client`, so the connection to the device is
/// reused across calls and scrapes. The client is `Send` and `Sync`.
pub struct ShellyClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ShellyClient {
    pub fn new(config: &ShellyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(concat!("shelly-exporter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.rpc_endpoint(),
        })
    }

    /// Base URL every method is appended to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches DeviceInfo, Config and Status, in that order.
    ///
    /// The first failing call aborts the cycle.
    pub async fn fetch_snapshot(&self) -> Result<DeviceSnapshot> {
        let device_info = self.call(RpcMethod::GetDeviceInfo).await?;
        let config = self.call(RpcMethod::GetConfig).await?;
        let status = self.call(RpcMethod::GetStatus).await?;

        Ok(DeviceSnapshot {
            device_info,
            config,
            status,
        })
    }

    async fn call(&self, method: RpcMethod) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, method.as_str());
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::DeviceStatus {
                method: method.as_str(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ExporterError::InvalidJson {
            method: method.as_str(),
            source,
        })
    }
}
