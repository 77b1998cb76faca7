//! Shelly RPC Documents
//!
//! The exporter reads three documents per scrape:
//!
//! - `Shelly.GetDeviceInfo` → model (`app`) and firmware (`ver`)
//! - `Shelly.GetConfig` → Bluetooth/cloud/MQTT enable flags
//! - `Shelly.GetStatus` → switch, system and WiFi readings
//!
//! Documents are kept as raw [`serde_json::Value`] trees. Fields are pulled
//! out one at a time through [`Document`], so a missing or mistyped field is
//! reported with its full dotted path instead of a generic parse failure.

use crate::error::{ExporterError, Result};
use serde_json::Value;

/// RPC methods queried on every scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    GetDeviceInfo,
    GetConfig,
    GetStatus,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::GetDeviceInfo => "Shelly.GetDeviceInfo",
            RpcMethod::GetConfig => "Shelly.GetConfig",
            RpcMethod::GetStatus => "Shelly.GetStatus",
        }
    }
}

/// The three raw documents fetched in one collection cycle
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub device_info: Value,
    pub config: Value,
    pub status: Value,
}

impl DeviceSnapshot {
    pub fn device_info(&self) -> Document<'_> {
        Document::new(RpcMethod::GetDeviceInfo, &self.device_info)
    }

    pub fn config(&self) -> Document<'_> {
        Document::new(RpcMethod::GetConfig, &self.config)
    }

    pub fn status(&self) -> Document<'_> {
        Document::new(RpcMethod::GetStatus, &self.status)
    }
}

/// Typed, path-addressed view over one RPC response
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    method: RpcMethod,
    root: &'a Value,
}

impl<'a> Document<'a> {
    pub fn new(method: RpcMethod, root: &'a Value) -> Self {
        Self { method, root }
    }

    /// Resolves a dotted path such as `switch:0.temperature.tC`.
    pub fn get(&self, path: &str) -> Result<&'a Value> {
        path.split('.')
            .try_fold(self.root, |node, segment| node.as_object()?.get(segment))
            .ok_or_else(|| ExporterError::MissingField {
                document: self.method.as_str(),
                path: path.to_string(),
            })
    }

    pub fn bool(&self, path: &str) -> Result<bool> {
        self.get(path)?
            .as_bool()
            .ok_or_else(|| self.invalid(path, "a boolean"))
    }

    pub fn number(&self, path: &str) -> Result<f64> {
        self.get(path)?
            .as_f64()
            .ok_or_else(|| self.invalid(path, "a number"))
    }

    /// Reads a label value. Strings are taken verbatim and numbers keep
    /// their JSON spelling; they are never reinterpreted.
    pub fn label(&self, path: &str) -> Result<String> {
        match self.get(path)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.invalid(path, "a string")),
        }
    }

    fn invalid(&self, path: &str, expected: &'static str) -> ExporterError {
        ExporterError::InvalidField {
            document: self.method.as_str(),
            path: path.to_string(),
            expected,
        }
    }
}
