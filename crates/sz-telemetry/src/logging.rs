//! Structured logging setup.
//!
//! Every log line goes to stderr. Stdout carries only the periodic report
//! lines, so the two never mix when the output is piped.

use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Parse the configured filter directive.
pub(crate) fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("log level {:?}: {}", config.log_level, e)))
}

/// Install the global subscriber.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_targets)
        .with_writer(std::io::stderr);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

/// Log a connection-related event with standard fields.
///
/// # Example
///
/// ```rust,ignore
/// log_conn_event!(info, conn.id(), peer, "Connection accepted");
/// log_conn_event!(warn, conn.id(), peer, "Malformed line", reason = %rejected);
/// ```
#[macro_export]
macro_rules! log_conn_event {
    ($level:ident, $conn_id:expr, $peer:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            conn_id = %$conn_id,
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}
