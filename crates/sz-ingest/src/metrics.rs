//! Runtime counters for ingestion
//!
//! Process-lifetime totals, independent of the per-interval report counters.
//! They are never reset and are logged once at shutdown.
//!
//! ## Usage
//!
//! ```
//! use sz_ingest::metrics::IngestMetrics;
//!
//! let metrics = IngestMetrics::new();
//! metrics.record_connection_opened();
//! metrics.record_chunk(512);
//! assert_eq!(metrics.snapshot().bytes_received, 512);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by connection handlers and the log writer.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Connections accepted
    pub connections_opened: AtomicU64,
    /// Connections that ended for any reason
    pub connections_closed: AtomicU64,
    /// Connections destroyed because of a malformed line
    pub connections_rejected: AtomicU64,
    /// Chunks fed through the pipeline
    pub chunks_processed: AtomicU64,
    /// Raw bytes read from sockets
    pub bytes_received: AtomicU64,
    /// Successful log appends
    pub batches_persisted: AtomicU64,
    /// Tokens written to the log
    pub tokens_persisted: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one chunk of `bytes` length
    pub fn record_chunk(&self, bytes: usize) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Record one append carrying `tokens` tokens
    pub fn record_batch_persisted(&self, tokens: usize) {
        self.batches_persisted.fetch_add(1, Ordering::Relaxed);
        self.tokens_persisted.fetch_add(tokens as u64, Ordering::Relaxed);
    }

    /// Connections currently open
    pub fn active_connections(&self) -> u64 {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            batches_persisted: self.batches_persisted.load(Ordering::Relaxed),
            tokens_persisted: self.tokens_persisted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub connections_rejected: u64,
    pub chunks_processed: u64,
    pub bytes_received: u64,
    pub batches_persisted: u64,
    pub tokens_persisted: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connections={}/{} rejected={} chunks={} bytes={} batches={} tokens={}",
            self.connections_closed,
            self.connections_opened,
            self.connections_rejected,
            self.chunks_processed,
            self.bytes_received,
            self.batches_persisted,
            self.tokens_persisted
        )
    }
}
