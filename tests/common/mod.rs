//! Shared fixtures: realistic Shelly Plus Plug S documents and a fake
//! device serving them over HTTP.

#![allow(dead_code)]

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use shelly_exporter::collectors::ShellyCollector;
use shelly_exporter::config::ShellyConfig;
use shelly_exporter::shelly::{DeviceSnapshot, ShellyClient};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const JOB: &str = "shelly-exporter";

pub fn device_info() -> Value {
    json!({
        "name": null,
        "id": "shellyplusplugs-e86beae9f3a0",
        "mac": "E86BEAE9F3A0",
        "model": "SNPL-00112EU",
        "gen": 2,
        "fw_id": "20230912-082903/1.0.3-g6176478",
        "ver": "1.0.3",
        "app": "PlusPlugS",
        "auth_en": false,
        "auth_domain": null
    })
}

pub fn device_config() -> Value {
    json!({
        "ble": {"enable": true, "rpc": {"enable": true}},
        "cloud": {"enable": false, "server": "shelly-103-eu.shelly.cloud:6022/jrpc"},
        "mqtt": {"enable": true, "server": "broker.local:1883", "client_id": "plug"},
        "switch:0": {"id": 0, "name": null, "initial_state": "restore_last"},
        "sys": {"device": {"name": null, "eco_mode": false}}
    })
}

pub fn device_status() -> Value {
    json!({
        "ble": {},
        "cloud": {"connected": false},
        "mqtt": {"connected": true},
        "switch:0": {
            "id": 0,
            "source": "init",
            "output": true,
            "apower": 12.7,
            "voltage": 229.8,
            "current": 0.081,
            "aenergy": {"total": 1234.56, "by_minute": [190.2, 191.0, 190.8], "minute_ts": 1697190060},
            "temperature": {"tC": 41.9, "tF": 107.4}
        },
        "sys": {
            "mac": "E86BEAE9F3A0",
            "restart_required": false,
            "time": "11:41",
            "unixtime": 1697190082,
            "uptime": 86400,
            "ram_size": 260484,
            "ram_free": 149472,
            "fs_size": 458752,
            "fs_free": 176128,
            "cfg_rev": 12,
            "available_updates": {}
        },
        "wifi": {"sta_ip": "192.168.1.50", "status": "got ip", "ssid": "home", "rssi": -61}
    })
}

pub fn snapshot() -> DeviceSnapshot {
    DeviceSnapshot {
        device_info: device_info(),
        config: device_config(),
        status: device_status(),
    }
}

/// Fake device listening on an ephemeral port
pub struct FakeDevice {
    pub addr: SocketAddr,
    polls: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl FakeDevice {
    pub async fn start(status: Value) -> Self {
        Self::start_with(device_info(), device_config(), status).await
    }

    pub async fn start_with(info: Value, config: Value, status: Value) -> Self {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();

        let app = Router::new()
            .route(
                "/rpc/Shelly.GetDeviceInfo",
                get(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let info = info.clone();
                    async move { Json(info) }
                }),
            )
            .route(
                "/rpc/Shelly.GetConfig",
                get(move || {
                    let config = config.clone();
                    async move { Json(config) }
                }),
            )
            .route(
                "/rpc/Shelly.GetStatus",
                get(move || {
                    let status = status.clone();
                    async move { Json(status) }
                }),
            );

        Self::serve(app, polls).await
    }

    /// Healthy device that holds every DeviceInfo request for `delay` and
    /// remembers how many were in flight at once
    pub async fn start_slow(delay: Duration) -> Self {
        let polls = Arc::new(AtomicUsize::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (counter, peak_seen) = (polls.clone(), peak.clone());

        let app = Router::new()
            .route(
                "/rpc/Shelly.GetDeviceInfo",
                get(move || {
                    let (counter, in_flight, peak) =
                        (counter.clone(), in_flight.clone(), peak_seen.clone());
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(delay).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Json(device_info())
                    }
                }),
            )
            .route("/rpc/Shelly.GetConfig", get(|| async { Json(device_config()) }))
            .route("/rpc/Shelly.GetStatus", get(|| async { Json(device_status()) }));

        let mut device = Self::serve(app, polls).await;
        device.peak_in_flight = peak;
        device
    }

    /// Device whose Status endpoint answers with a non-JSON body
    pub async fn start_garbled() -> Self {
        let polls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/rpc/Shelly.GetDeviceInfo",
                get(|| async { Json(device_info()) }),
            )
            .route("/rpc/Shelly.GetConfig", get(|| async { Json(device_config()) }))
            .route("/rpc/Shelly.GetStatus", get(|| async { "<html>oops</html>" }));

        Self::serve(app, polls).await
    }

    /// Device whose Config endpoint fails with a 500
    pub async fn start_failing() -> Self {
        let polls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/rpc/Shelly.GetDeviceInfo",
                get(|| async { Json(device_info()) }),
            )
            .route(
                "/rpc/Shelly.GetConfig",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            );

        Self::serve(app, polls).await
    }

    async fn serve(app: Router, polls: Arc<AtomicUsize>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake device");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake device failed");
        });
        Self {
            addr,
            polls,
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of DeviceInfo requests seen, i.e. collection cycles started
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Most DeviceInfo requests ever handled concurrently (slow device only)
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> ShellyConfig {
        ShellyConfig {
            host: self.addr.to_string(),
            timeout_seconds: 5,
            ..ShellyConfig::default()
        }
    }

    pub fn collector(&self) -> ShellyCollector {
        let client = ShellyClient::new(&self.config()).expect("Failed to create client");
        ShellyCollector::new(client, JOB)
    }
}

/// Config pointing at a port nothing listens on
pub fn unreachable_config() -> ShellyConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    drop(listener);

    ShellyConfig {
        host: addr.to_string(),
        timeout_seconds: 2,
        ..ShellyConfig::default()
    }
}
