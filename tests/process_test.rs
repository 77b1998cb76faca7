//! Process tests
//!
//! Runs the compiled exporter binary and checks that fatal conditions end
//! the process with a non-zero status.

mod common;

use std::net::TcpListener;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const EXPORTER: &str = env!("CARGO_BIN_EXE_shelly-exporter");

fn exporter() -> Command {
    let mut command = Command::new(EXPORTER);
    command
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("SHELLY_SCHEME")
        .env_remove("SHELLY_EXPORTER_NAME")
        .env_remove("RUST_LOG")
        .env("SHELLY_EXPORTER_LOGLEVEL", "info")
        .env("TZ", "UTC")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local address").port()
}

async fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().expect("Failed to poll exporter") {
            return Some(status);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}

#[tokio::test]
async fn test_empty_host_exits_before_serving() {
    // Given: No device host configured
    let port = free_port();
    let mut child = exporter()
        .env("SHELLY_HOST", "")
        .env("SHELLY_EXPORTER_ADDR", "127.0.0.1")
        .env("SHELLY_EXPORTER_PORT", port.to_string())
        .spawn()
        .expect("Failed to start exporter");

    // When: The exporter starts
    let status = wait_for_exit(&mut child, Duration::from_secs(10)).await;

    // Then: It exits with status 1 and never listens
    if status.is_none() {
        child.kill().ok();
    }
    assert_eq!(status.and_then(|s| s.code()), Some(1));
    assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_err());
}

#[tokio::test]
async fn test_unreachable_device_exits_on_first_scrape() {
    // Given: An exporter pointed at a closed device port
    let device = common::unreachable_config();
    let port = free_port();
    let mut child = exporter()
        .env("SHELLY_HOST", &device.host)
        .env("SHELLY_TIMEOUT_SECONDS", "2")
        .env("SHELLY_EXPORTER_ADDR", "127.0.0.1")
        .env("SHELLY_EXPORTER_PORT", port.to_string())
        .spawn()
        .expect("Failed to start exporter");

    // When: A scrape arrives once the listener is up
    let url = format!("http://127.0.0.1:{}/metrics", port);
    let client = reqwest::Client::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match client.get(&url).send().await {
            // The process may drop the connection while exiting
            Ok(_) => break,
            Err(e) if e.is_connect() && Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(_) => break,
        }
    }

    // Then: The process terminates with status 1
    let status = wait_for_exit(&mut child, Duration::from_secs(10)).await;
    if status.is_none() {
        child.kill().ok();
    }
    assert_eq!(status.and_then(|s| s.code()), Some(1));
}
