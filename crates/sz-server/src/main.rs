//! # Serializator
//!
//! Listens for newline-terminated 9-digit numbers, writes every new one to
//! the number log once and prints a report line every interval.
//!
//! ## Exit Status
//!
//! - `0`: terminate keyword or Ctrl-C
//! - `1`: a log append failed
//! - `2`: startup failed (bad configuration, bind or log truncation)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use sz_server::{ServerConfig, ServerRuntime, ShutdownReason};
use sz_telemetry::{init_telemetry, TelemetryConfig};

const STARTUP_FAILURE: i32 = 2;

/// Serializator: deduplicating TCP number log
#[derive(Parser, Debug)]
#[command(name = "serializator")]
#[command(about = "Accepts 9-digit numbers over TCP and logs each unique one once")]
struct Args {
    /// Interface to listen on
    #[arg(long, env = "SZ_HOST", default_value = "0.0.0.0")]
    host: String,

    /// TCP port
    #[arg(short, long, env = "SZ_PORT", default_value = "4000")]
    port: u16,

    /// Simultaneous client connections
    #[arg(long, env = "SZ_MAX_CONNECTIONS", default_value = "5")]
    max_connections: usize,

    /// Number log, truncated at startup
    #[arg(long, env = "SZ_LOG_FILE", default_value = "numbers.log")]
    log_file: PathBuf,

    /// Seconds between report lines
    #[arg(long, env = "SZ_REPORT_INTERVAL_SECS", default_value = "10")]
    report_interval_secs: u64,

    /// Line that shuts the service down
    #[arg(long, env = "SZ_TERMINATE_KEYWORD", default_value = "terminate")]
    terminate_keyword: String,

    /// Per-connection read buffer size
    #[arg(long, env = "SZ_READ_BUFFER_BYTES", default_value = "8192")]
    read_buffer_bytes: usize,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.network.host = self.host;
        config.network.port = self.port;
        config.network.max_connections = self.max_connections;
        config.network.read_buffer_bytes = self.read_buffer_bytes;
        config.storage.log_file = self.log_file;
        config.reporting.interval = Duration::from_secs(self.report_interval_secs);
        config.ingest.terminate_keyword = self.terminate_keyword;
        config
    }
}

async fn run(config: ServerConfig) -> Result<ShutdownReason> {
    let runtime = ServerRuntime::bind(config)
        .await
        .context("Failed to start server")?;

    let signal = runtime.shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.trigger(ShutdownReason::Interrupted);
        }
    });

    info!("Service is running. Send the terminate keyword or press Ctrl+C to stop.");
    let reason = runtime.run().await.context("Server failed")?;
    Ok(reason)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env();
    let _guard = match init_telemetry(&telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(STARTUP_FAILURE);
        }
    };

    let reason = match run(args.into_config()).await {
        Ok(reason) => reason,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(STARTUP_FAILURE);
        }
    };

    info!(reason = %reason, "Shutdown complete");
    std::process::exit(reason.exit_code());
}
