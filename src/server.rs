//! HTTP Server
//!
//! This module implements the exporter's HTTP endpoint. There is no
//! background collection loop: every scrape of `/metrics` polls the device
//! live and renders the result before responding.
//!
//! # Endpoints
//!
//! - `GET /` - 301 redirect to `/metrics`
//! - `GET /metrics` - Prometheus metrics (text, or protobuf when asked for);
//!   `name[]` query parameters restrict the output to those families
//! - `GET /favicon.ico` - empty 200, so browsers don't trigger a device poll
//! - anything else - empty 404
//!
//! Only `GET` is routed: other methods on the three known paths get 405.
//!
//! Every response carries cache-suppression headers and
//! `X-Content-Type-Options: nosniff`. Bodies are gzip-compressed when the
//! client accepts it, unless `disable_compression` is set.
//!
//! # Concurrency
//!
//! Requests are served concurrently, but collection and rendering run under
//! a single mutex: the device sees at most one poll at a time.
//!
//! # Error Handling
//!
//! A failed collection is fatal. With [`FailurePolicy::Exit`] the handler
//! logs the cause and terminates the process so a supervisor can restart it.

use crate::collectors::ShellyCollector;
use crate::config::Config;
use crate::error::{ExporterError, Result};
use crate::metrics::{ExpositionFormat, MetricsRegistry};
use crate::shelly::ShellyClient;
use axum::{
    extract::{Query, State},
    http::{header, Extensions, HeaderMap, HeaderValue, StatusCode, Version},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::compression::{predicate::DefaultPredicate, CompressionLayer, Predicate};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};

/// What a scrape does when collection fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and terminate the process with exit status 1
    Exit,
    /// Answer 500 with the error text and keep serving
    Respond,
}

#[derive(Clone)]
pub struct AppState {
    collector: Arc<ShellyCollector>,
    metrics: Arc<MetricsRegistry>,
    scrape_lock: Arc<Mutex<()>>,
    failure_policy: FailurePolicy,
}

impl AppState {
    pub fn new(
        collector: ShellyCollector,
        metrics: MetricsRegistry,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            collector: Arc::new(collector),
            metrics: Arc::new(metrics),
            scrape_lock: Arc::new(Mutex::new(())),
            failure_policy,
        }
    }
}

/// Builds the exporter router around `state`.
pub fn build_router(state: AppState, disable_compression: bool) -> Router {
    let compress = !disable_compression;
    let compression = CompressionLayer::new().compress_when(DefaultPredicate::new().and(
        move |_: StatusCode, _: Version, _: &HeaderMap, _: &Extensions| compress,
    ));

    Router::new()
        .route("/", get(root_handler))
        .route("/favicon.ico", get(favicon_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(compression)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

/// Binds the listener and serves until the process ends.
pub async fn start(config: Config) -> anyhow::Result<()> {
    let client = ShellyClient::new(&config.shelly)?;
    let collector = ShellyCollector::new(client, config.server.name.clone());
    let state = AppState::new(collector, MetricsRegistry::new()?, FailurePolicy::Exit);

    let app = build_router(state, config.server.disable_compression);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn scrape(state: &AppState, format: ExpositionFormat, names: &[String]) -> Result<Vec<u8>> {
    let _guard = state.scrape_lock.lock().await;
    let records = state.collector.collect().await?;
    state.metrics.render(&records, format, names)
}

async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let format = ExpositionFormat::negotiate(accept);

    let names: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| key == "name[]")
        .map(|(_, value)| value)
        .collect();

    match scrape(&state, format, &names).await {
        Ok(body) => ([(header::CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(e) => {
            error!("Failed to collect metrics: {}", e);
            match state.failure_policy {
                FailurePolicy::Exit => std::process::exit(1),
                FailurePolicy::Respond => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error collecting metrics: {}", e),
                )
                    .into_response(),
            }
        }
    }
}

async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/metrics")],
    )
}

async fn favicon_handler() -> StatusCode {
    StatusCode::OK
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}
