//! # SZ Telemetry
//!
//! Structured logging for the serializator service, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sz_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SZ_LOG_LEVEL` | `info` | Log filter, falls back to `RUST_LOG` |
//! | `SZ_JSON_LOGS` | `false` | Emit JSON lines |
//! | `SZ_LOG_TARGETS` | `true` | Include event targets |
//! | `SZ_SERVICE_NAME` | `serializator` | Service name in startup logs |

mod config;
mod logging;

pub use config::TelemetryConfig;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install the global log subscriber.
///
/// Returns a guard that should be held for the lifetime of the application.
/// Calling this a second time in one process fails with
/// [`TelemetryError::SubscriberInit`].
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        filter = %config.log_level,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active for the process lifetime.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Shutting down telemetry");
    }
}
