use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Device request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Device returned HTTP {status} for {method}")]
    DeviceStatus { method: &'static str, status: u16 },

    #[error("Invalid JSON response from {method}: {source}")]
    InvalidJson {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field `{path}` in {document} response")]
    MissingField { document: &'static str, path: String },

    #[error("Field `{path}` in {document} response is not {expected}")]
    InvalidField {
        document: &'static str,
        path: String,
        expected: &'static str,
    },

    #[error("No catalog entry for metric key `{0}`")]
    UnknownMetric(String),

    #[error("Counter {name} cannot take negative value {value}")]
    NegativeCounter { name: &'static str, value: i64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
