//! Prometheus Metrics Definitions
//!
//! This module holds the static metric catalog and the registry that turns
//! one scrape's [`ExpositionRecord`]s into Prometheus exposition output.
//!
//! # Metric Categories
//!
//! ## Feature Flags (gauge, 1=enabled, 0=disabled)
//! - `shelly_bluetooth_state`, `shelly_cloud_state`, `shelly_mqtt_state`
//!
//! ## Switch Channel
//! - `shelly_output_state` - relay output (1=on, 0=off)
//! - `shelly_apower`, `shelly_voltage`, `shelly_current`, `shelly_temperature`
//!
//! ## System
//! - `shelly_uptime` - seconds since boot (counter, resets on reboot)
//! - `shelly_ram_size`, `shelly_ram_free`, `shelly_fs_size`, `shelly_fs_free`
//!
//! ## Network
//! - `shelly_wifi_rssi`
//!
//! Every sample carries the `firmware`, `job`, `model` and `wifi_ip` labels.
//! Values are integers: device readings are truncated toward zero.

use crate::collectors::ExpositionRecord;
use crate::error::{ExporterError, Result};
use prometheus::{
    Encoder, IntCounterVec, IntGaugeVec, Opts, ProtobufEncoder, Registry, TextEncoder,
};
use std::collections::{BTreeMap, HashMap};

/// Prefix of every exposition name
pub const NAMESPACE: &str = "shelly";

pub const LABEL_FIRMWARE: &str = "firmware";
pub const LABEL_JOB: &str = "job";
pub const LABEL_MODEL: &str = "model";
pub const LABEL_WIFI_IP: &str = "wifi_ip";

/// Label names attached to every sample, in exposition order
pub const LABEL_NAMES: [&str; 4] = [LABEL_FIRMWARE, LABEL_JOB, LABEL_MODEL, LABEL_WIFI_IP];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    /// Monotonic while the device is up, resets to 0 on reboot
    Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
}

const fn gauge(key: &'static str, name: &'static str, help: &'static str) -> MetricSpec {
    MetricSpec {
        key,
        name,
        help,
        kind: MetricKind::Gauge,
    }
}

pub static CATALOG: [MetricSpec; 14] = [
    gauge(
        "bluetooth_state",
        "shelly_bluetooth_state",
        "Bluetooth State (1: ON, 0: OFF)",
    ),
    gauge("cloud_state", "shelly_cloud_state", "Cloud State (1: ON, 0: OFF)"),
    gauge("mqtt_state", "shelly_mqtt_state", "MQTT State (1: ON, 0: OFF)"),
    gauge("apower", "shelly_apower", "Power (Watt)"),
    gauge("voltage", "shelly_voltage", "Voltage (Volt)"),
    gauge("current", "shelly_current", "Current (Ampere)"),
    gauge(
        "output_state",
        "shelly_output_state",
        "Output State (1: ON, 0: OFF)",
    ),
    gauge("temperature", "shelly_temperature", "Temperature (°C)"),
    gauge("wifi_rssi", "shelly_wifi_rssi", "Wifi Signal Strength"),
    gauge("fs_size", "shelly_fs_size", "Total amount of FS in bytes"),
    gauge("fs_free", "shelly_fs_free", "Available amount of FS in bytes"),
    gauge("ram_size", "shelly_ram_size", "Total amount of RAM in bytes"),
    gauge("ram_free", "shelly_ram_free", "Available amount of RAM in bytes"),
    MetricSpec {
        key: "uptime",
        name: "shelly_uptime",
        help: "Seconds elapsed since boot",
        kind: MetricKind::Counter,
    },
];

/// Looks up a catalog entry by field key
pub fn lookup(key: &str) -> Option<&'static MetricSpec> {
    CATALOG.iter().find(|spec| spec.key == key)
}

/// Wire format chosen from the scrape's `Accept` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpositionFormat {
    Text,
    Protobuf,
}

impl ExpositionFormat {
    /// Picks protobuf only when the scraper explicitly asks for the
    /// delimited `MetricFamily` encoding; text otherwise.
    pub fn negotiate(accept: Option<&str>) -> Self {
        let Some(accept) = accept else {
            return ExpositionFormat::Text;
        };

        let wants_protobuf = accept.split(',').any(|media_range| {
            let mut parts = media_range.split(';').map(str::trim);
            let media_type = parts.next().unwrap_or_default();
            let mut describes_families = false;
            for param in parts {
                match param.split_once('=').map(|(k, v)| (k.trim(), v.trim())) {
                    Some(("proto", "io.prometheus.client.MetricFamily")) => {
                        describes_families = true
                    }
                    // q=0 means "not acceptable"
                    Some(("q", q)) if q.parse::<f32>().is_ok_and(|q| q <= 0.0) => {
                        return false
                    }
                    _ => {}
                }
            }
            media_type == "application/vnd.google.protobuf" && describes_families
        });

        if wants_protobuf {
            ExpositionFormat::Protobuf
        } else {
            ExpositionFormat::Text
        }
    }

    pub fn content_type(&self) -> String {
        match self {
            ExpositionFormat::Text => format!("{}; charset=utf-8", TextEncoder::new().format_type()),
            ExpositionFormat::Protobuf => ProtobufEncoder::new().format_type().to_string(),
        }
    }
}

enum CatalogMetric {
    Gauge(IntGaugeVec),
    Counter(IntCounterVec),
}

/// Registry holding one labelled metric per catalog entry
///
/// Built once at startup and shared through the server state. Each call to
/// [`MetricsRegistry::render`] clears every series and repopulates it from
/// the records of the current scrape, so nothing leaks between scrapes.
/// Callers must serialize `render` calls.
pub struct MetricsRegistry {
    registry: Registry,
    metrics: BTreeMap<&'static str, CatalogMetric>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let mut metrics = BTreeMap::new();

        for spec in CATALOG.iter() {
            let opts = Opts::new(spec.name, spec.help);
            let metric = match spec.kind {
                MetricKind::Gauge => {
                    let vec = IntGaugeVec::new(opts, &LABEL_NAMES)?;
                    registry.register(Box::new(vec.clone()))?;
                    CatalogMetric::Gauge(vec)
                }
                MetricKind::Counter => {
                    let vec = IntCounterVec::new(opts, &LABEL_NAMES)?;
                    registry.register(Box::new(vec.clone()))?;
                    CatalogMetric::Counter(vec)
                }
            };
            metrics.insert(spec.key, metric);
        }

        Ok(Self { registry, metrics })
    }

    /// Encodes `records` in `format`.
    ///
    /// A non-empty `names` keeps only the metric families listed there.
    pub fn render(
        &self,
        records: &[ExpositionRecord],
        format: ExpositionFormat,
        names: &[String],
    ) -> Result<Vec<u8>> {
        self.reset();

        for record in records {
            if !names.is_empty() && !names.iter().any(|name| name == record.spec.name) {
                continue;
            }
            self.observe(record)?;
        }

        let families = self.registry.gather();
        let mut buffer = Vec::new();
        match format {
            ExpositionFormat::Text => TextEncoder::new().encode(&families, &mut buffer)?,
            ExpositionFormat::Protobuf => ProtobufEncoder::new().encode(&families, &mut buffer)?,
        }
        Ok(buffer)
    }

    /// Renders `records` as Prometheus text
    pub fn render_text(&self, records: &[ExpositionRecord]) -> Result<String> {
        let buffer = self.render(records, ExpositionFormat::Text, &[])?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Server(e.to_string()))
    }

    fn observe(&self, record: &ExpositionRecord) -> Result<()> {
        let metric = self
            .metrics
            .get(record.spec.key)
            .ok_or_else(|| ExporterError::UnknownMetric(record.spec.key.to_string()))?;

        let labels: HashMap<&str, &str> = record.labels.iter().collect();
        match metric {
            CatalogMetric::Gauge(vec) => vec.get_metric_with(&labels)?.set(record.value),
            CatalogMetric::Counter(vec) => {
                let value =
                    u64::try_from(record.value).map_err(|_| ExporterError::NegativeCounter {
                        name: record.spec.name,
                        value: record.value,
                    })?;
                vec.get_metric_with(&labels)?.inc_by(value);
            }
        }
        Ok(())
    }

    fn reset(&self) {
        for metric in self.metrics.values() {
            match metric {
                CatalogMetric::Gauge(vec) => vec.reset(),
                CatalogMetric::Counter(vec) => vec.reset(),
            }
        }
    }
}
