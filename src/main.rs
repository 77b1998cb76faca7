use anyhow::Result;
use clap::Parser;
use shelly_exporter::{
    config::{Config, Scheme},
    error::ExporterError,
    logging::{self, LogSettings},
    server,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Shelly device host or IP (overrides config)
    #[arg(long, env = "SHELLY_HOST")]
    host: Option<String>,

    /// Device URL scheme: http or https (overrides config)
    #[arg(long, env = "SHELLY_SCHEME")]
    scheme: Option<String>,

    /// Per-request device timeout in seconds (overrides config)
    #[arg(long, env = "SHELLY_TIMEOUT_SECONDS")]
    timeout: Option<u64>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "SHELLY_EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "SHELLY_EXPORTER_ADDR")]
    addr: Option<String>,

    /// Exporter name, exposed as the `job` label
    #[arg(long, env = "SHELLY_EXPORTER_NAME")]
    name: Option<String>,

    /// Log level (trace, debug, info, warning, error)
    #[arg(long, env = "SHELLY_EXPORTER_LOGLEVEL")]
    log_level: Option<String>,

    /// Timezone for log timestamps
    #[arg(long, env = "TZ")]
    timezone: Option<String>,
}

impl Args {
    /// Applies CLI/environment overrides on top of the loaded file config.
    fn apply(self, config: &mut Config) -> Result<(), ExporterError> {
        if let Some(host) = self.host {
            config.shelly.host = host;
        }
        if let Some(scheme) = self.scheme {
            config.shelly.scheme = scheme.parse::<Scheme>()?;
        }
        if let Some(timeout) = self.timeout {
            config.shelly.timeout_seconds = timeout;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(name) = self.name {
            config.server.name = name;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(timezone) = self.timezone {
            config.logging.timezone = timezone;
        }
        Ok(())
    }
}

/// Logs with the fallback subscriber and exits; used before logging is set up.
fn fail_early(message: impl std::fmt::Display) -> ! {
    logging::init(LogSettings::default());
    error!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => fail_early(format!("{:#}", e)),
    };
    if let Err(e) = args.apply(&mut config) {
        fail_early(e);
    }

    // Initialize tracing
    match LogSettings::from_config(&config.logging) {
        Ok(settings) => logging::init(settings),
        Err(e) => fail_early(e),
    }

    info!(
        "Starting Shelly Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded successfully");
    info!(
        "Shelly device: {}://{}",
        config.shelly.scheme, config.shelly.host
    );
    info!("Exporter name: {}", config.server.name);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Serve from a background task; the main task only waits for it to end
    // or for a termination signal
    let server = tokio::spawn(server::start(config));

    tokio::select! {
        joined = server => {
            match joined {
                Ok(Ok(())) => info!("Metrics server stopped"),
                Ok(Err(e)) => {
                    error!("Server error: {:#}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("Server task failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ = shutdown_signal() => info!("Shutdown signal received, exiting"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
