//! Shelly Prometheus Exporter
//!
//! A Prometheus metrics exporter for a single Shelly Gen2+ smart switch.
//!
//! # Overview
//!
//! On every scrape of `/metrics` the exporter queries the device's local RPC
//! API, reconciles the three responses into one label set and a handful of
//! integer readings, and renders them in Prometheus format. Nothing is cached
//! between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     HTTP GET /rpc     ┌──────────────┐
//! │   Shelly    │ ◄──────────────────►  │   Exporter   │
//! │   device    │   GetDeviceInfo       │              │
//! └─────────────┘   GetConfig           │  ┌────────┐  │      HTTP      ┌────────────┐
//!                   GetStatus           │  │ Client │  │ ◄────────────► │ Prometheus │
//!                                       │  └────────┘  │   /metrics     └────────────┘
//!                                       │  ┌────────┐  │
//!                                       │  │Metrics │  │
//!                                       │  └────────┘  │
//!                                       └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`shelly`] - RPC client and document access
//! - [`collectors`] - Field extraction and label/metric reconciliation
//! - [`metrics`] - Metric catalog and Prometheus rendering
//! - [`server`] - HTTP endpoint
//! - [`config`] - Configuration management
//! - [`logging`] - Subscriber setup with timezone-aware timestamps
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use shelly_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Failure Model
//!
//! Any device or configuration error is fatal: the process logs the cause
//! and exits non-zero, leaving restarts to the supervisor.

pub mod collectors;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod shelly;
