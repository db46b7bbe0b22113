//! Error types for the ingestion subsystem

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the ingestion subsystem
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid ingest configuration: {0}")]
    Config(String),

    #[error("Number log failure: {0}")]
    Log(#[from] LogError),

    #[error("Log writer is no longer running")]
    WriterClosed,
}

/// Errors from number log backends (driven port)
///
/// Every variant is fatal to the service: the log is the only durability
/// layer, so a failed append means the dedup store and the log have diverged.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Injected failure: {0}")]
    Injected(String),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
