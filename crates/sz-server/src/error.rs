//! Error types for the server

use thiserror::Error;

use crate::config::ConfigError;
use sz_ingest::IngestError;

/// Errors that stop the server from starting or running
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion failure: {0}")]
    Ingest(#[from] IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
