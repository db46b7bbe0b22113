//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or `target=level` lists)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the event target in each line
    pub with_targets: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "serializator".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_targets: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SZ_SERVICE_NAME`: Service name (default: serializator)
    /// - `SZ_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `SZ_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `SZ_LOG_TARGETS`: Print event targets (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("SZ_SERVICE_NAME")
                .unwrap_or_else(|_| "serializator".to_string()),

            log_level: env::var("SZ_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("SZ_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            with_targets: env::var("SZ_LOG_TARGETS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Builder-style method to override the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
