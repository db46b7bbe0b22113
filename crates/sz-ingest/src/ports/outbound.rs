//! Outbound Ports (Driven Ports)
//!
//! The ingestion subsystem depends on exactly one external resource: an
//! append-only log of accepted tokens.

use async_trait::async_trait;

use crate::error::LogError;

/// Append-only number log (Driven Port)
///
/// Implementations are driven by a single writer task, so methods take
/// `&mut self` and never see concurrent calls.
#[async_trait]
pub trait NumberLog: Send {
    /// Create the log, or truncate it to empty if it exists.
    async fn reset(&mut self) -> Result<(), LogError>;

    /// Append `bytes` as one write. Partial appends are reported as errors.
    async fn append(&mut self, bytes: &[u8]) -> Result<(), LogError>;

    /// Human-readable location used in log messages
    fn describe(&self) -> String;
}
