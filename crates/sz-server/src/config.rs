//! # Server Configuration
//!
//! Unified configuration for the listener, the number log, reporting and the
//! wire rules.
//!
//! All limits have sane defaults with override capability from the command
//! line or the environment (see `main.rs`).

use std::path::PathBuf;
use std::time::Duration;

use sz_ingest::{IngestConfig, IngestError};
use thiserror::Error;

/// Complete server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Reporting configuration.
    pub reporting: ReportingConfig,
    /// Wire rules shared by every connection.
    pub ingest: IngestConfig,
}

impl ServerConfig {
    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.max_connections == 0 {
            return Err(ConfigError::NoConnectionSlots);
        }
        if self.network.read_buffer_bytes == 0 {
            return Err(ConfigError::EmptyReadBuffer);
        }
        if self.storage.writer_queue == 0 {
            return Err(ConfigError::EmptyWriterQueue);
        }
        if self.reporting.interval.is_zero() {
            return Err(ConfigError::ZeroReportInterval);
        }
        self.ingest.validate()?;
        Ok(())
    }

    /// `host:port` string handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.network.host, self.network.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_connections must be at least 1")]
    NoConnectionSlots,

    #[error("read_buffer_bytes must be at least 1")]
    EmptyReadBuffer,

    #[error("writer_queue must be at least 1")]
    EmptyWriterQueue,

    #[error("report interval must be greater than zero")]
    ZeroReportInterval,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Interface to listen on.
    pub host: String,
    /// TCP port; 0 picks an ephemeral port.
    pub port: u16,
    /// Simultaneous connections served. Extra clients wait in the backlog.
    pub max_connections: usize,
    /// Size of the per-connection read buffer.
    pub read_buffer_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            max_connections: 5,
            read_buffer_bytes: 8192,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Number log, truncated at startup.
    pub log_file: PathBuf,
    /// Batches the log writer may have queued.
    pub writer_queue: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("numbers.log"),
            writer_queue: sz_ingest::adapters::DEFAULT_WRITER_QUEUE,
        }
    }
}

/// Reporting and shutdown timing.
#[derive(Debug, Clone)]
pub struct ReportingConfig {
    /// Period between report lines.
    pub interval: Duration,
    /// How long a clean shutdown waits for queued appends.
    pub shutdown_grace: Duration,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}
