//! Metrics Collectors
//!
//! One collection cycle turns a live [`DeviceSnapshot`] into a list of
//! [`ExpositionRecord`]s:
//!
//! 1. Each RPC document has its own extractor ([`device_info`],
//!    [`device_config`], [`status`]) that moves fields into either the
//!    [`LabelSet`] (identity, string-valued) or the [`ObservationSet`]
//!    (numeric readings).
//! 2. [`build_records`] drops observations shadowed by a label of the same
//!    name, joins the rest with the metric catalog and attaches the full
//!    label set to each record.
//!
//! # Error Handling
//!
//! Nothing here is retried or degraded: the first failure (transport,
//! malformed JSON, missing field, unknown catalog key) is returned to the
//! caller, which decides whether the process should exit.

use crate::error::{ExporterError, Result};
use crate::metrics::{self, MetricSpec, LABEL_JOB};
use crate::shelly::{DeviceSnapshot, ShellyClient};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub mod device_config;
pub mod device_info;
pub mod status;

/// Labels attached identically to every sample of one scrape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<&'static str, String>);

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in label-name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

/// Numeric readings of one scrape, keyed by catalog key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationSet(BTreeMap<&'static str, i64>);

impl ObservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reading, truncated toward zero (`12.7` → `12`, `-3.9` → `-3`).
    pub fn insert(&mut self, key: &'static str, value: f64) {
        self.0.insert(key, value.trunc() as i64);
    }

    /// Records a boolean as 1 or 0.
    pub fn insert_flag(&mut self, key: &'static str, enabled: bool) {
        self.0.insert(key, i64::from(enabled));
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.0.iter().map(|(key, value)| (*key, *value))
    }
}

/// One sample ready for exposition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpositionRecord {
    pub spec: &'static MetricSpec,
    pub value: i64,
    pub labels: LabelSet,
}

/// Polls the device and reconciles the result, once per scrape
pub struct ShellyCollector {
    client: ShellyClient,
    job: String,
}

impl ShellyCollector {
    pub fn new(client: ShellyClient, job: impl Into<String>) -> Self {
        Self {
            client,
            job: job.into(),
        }
    }

    pub async fn collect(&self) -> Result<Vec<ExpositionRecord>> {
        let snapshot = self.client.fetch_snapshot().await?;
        let records = reconcile(&self.job, &snapshot)?;
        info!(
            "Collected {} metrics from {}",
            records.len(),
            self.client.endpoint()
        );
        Ok(records)
    }
}

/// Extracts labels and observations from `snapshot` and joins them with the
/// catalog.
pub fn reconcile(job: &str, snapshot: &DeviceSnapshot) -> Result<Vec<ExpositionRecord>> {
    let mut labels = LabelSet::new();
    let mut observations = ObservationSet::new();

    labels.insert(LABEL_JOB, job);
    device_info::extract(&snapshot.device_info(), &mut labels)?;
    device_config::extract(&snapshot.config(), &mut observations)?;
    status::extract(&snapshot.status(), &mut labels, &mut observations)?;

    debug!("Labels: {:?}", labels);
    debug!("Observations: {:?}", observations);

    build_records(&labels, &observations)
}

/// Joins observations with the catalog.
///
/// An observation whose key is also a label name is not emitted. A key with
/// no catalog entry is an [`ExporterError::UnknownMetric`].
pub fn build_records(
    labels: &LabelSet,
    observations: &ObservationSet,
) -> Result<Vec<ExpositionRecord>> {
    observations
        .iter()
        .filter(|(key, _)| !labels.contains(key))
        .map(|(key, value)| {
            let spec =
                metrics::lookup(key).ok_or_else(|| ExporterError::UnknownMetric(key.to_string()))?;
            Ok(ExpositionRecord {
                spec,
                value,
                labels: labels.clone(),
            })
        })
        .collect()
}
