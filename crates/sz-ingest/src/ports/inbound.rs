//! Inbound Ports (Driving Ports)
//!
//! The API connection handlers use to push raw chunks through the pipeline.

use std::fmt;

use crate::domain::{ConnectionId, ConnectionState, ReportSnapshot, WriteBatch};

/// Longest slice of a rejected line kept for diagnostics.
const PREVIEW_LIMIT: usize = 32;

/// A line that failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedLine {
    /// Lossy, truncated rendering of the line
    pub preview: String,
    /// Full length in bytes
    pub len: usize,
    /// Whether the line had its delimiter
    pub terminated: bool,
}

impl RejectedLine {
    pub(crate) fn new(bytes: &[u8], terminated: bool) -> Self {
        let shown = &bytes[..bytes.len().min(PREVIEW_LIMIT)];
        Self {
            preview: String::from_utf8_lossy(shown).into_owned(),
            len: bytes.len(),
            terminated,
        }
    }
}

impl fmt::Display for RejectedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({} bytes", self.preview, self.len)?;
        if !self.terminated {
            write!(f, ", unterminated")?;
        }
        write!(f, ")")
    }
}

/// What the connection handler must do after a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkVerdict {
    /// Keep reading
    Continue,
    /// Destroy this connection; the rest of the chunk was discarded
    CloseConnection(RejectedLine),
    /// The terminate keyword arrived; stop the whole service
    Shutdown,
}

/// Result of feeding one chunk through the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Newly-unique tokens to persist, in arrival order
    pub batch: WriteBatch,
    /// Number of duplicates seen in this chunk
    pub duplicates: u64,
    pub verdict: ChunkVerdict,
}

/// Primary ingestion API (Driving Port)
pub trait IngestionApi: Send + Sync {
    /// Fresh state for a newly accepted connection
    fn open_connection(&self, id: ConnectionId) -> ConnectionState;

    /// Process one raw chunk read from `conn`.
    ///
    /// Lines are handled in arrival order: the terminate keyword stops the
    /// chunk with [`ChunkVerdict::Shutdown`], a complete token is counted as
    /// unique or duplicate, and anything malformed stops the chunk with
    /// [`ChunkVerdict::CloseConnection`]. The returned batch holds every token
    /// inserted into the dedup store while processing the chunk and must be
    /// persisted regardless of the verdict.
    fn ingest_chunk(&self, conn: &mut ConnectionState, chunk: &[u8]) -> ChunkOutcome;

    /// Emit the interval counters and reset them.
    fn take_report(&self) -> ReportSnapshot;

    /// Distinct tokens accepted since start
    fn unique_total(&self) -> usize;
}
