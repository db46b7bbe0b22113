//! Ingestion Service
//!
//! Owns the process-wide dedup store and report counters, and runs every
//! chunk of every connection through frame buffer → validator → dedup store.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::invariants::{invariant_batch_distinct, invariant_fragment_bounded};
use crate::domain::{
    classify, ConnectionId, ConnectionState, DedupStore, IngestConfig, ReportCounters,
    ReportSnapshot, Token, TokenClass, WriteBatch,
};
use crate::error::IngestError;
use crate::metrics::IngestMetrics;
use crate::ports::{ChunkOutcome, ChunkVerdict, IngestionApi, RejectedLine};

/// State shared by all connections.
///
/// Store and counters sit behind one lock so a token's dedup decision and
/// its counter update are never observed apart.
#[derive(Debug, Default)]
struct SharedState {
    store: DedupStore,
    counters: ReportCounters,
}

/// Ingestion service implementation
///
/// Implements the `IngestionApi` port. One instance lives for the whole
/// process and is shared by every connection handler through an `Arc`.
pub struct IngestionService {
    config: IngestConfig,
    shared: Mutex<SharedState>,
    metrics: Arc<IngestMetrics>,
}

impl IngestionService {
    /// Create a service with its own metrics
    pub fn new(config: IngestConfig) -> Result<Self, IngestError> {
        Self::with_metrics(config, Arc::new(IngestMetrics::new()))
    }

    /// Create a service recording into shared `metrics`
    pub fn with_metrics(
        config: IngestConfig,
        metrics: Arc<IngestMetrics>,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Mutex::new(SharedState::default()),
            metrics,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// What one line did to the chunk in progress.
enum LineEffect {
    Accepted,
    Stop(ChunkVerdict),
}

impl IngestionService {
    /// Run one line through keyword check, validation and dedup.
    fn ingest_line(
        &self,
        shared: &mut SharedState,
        line: &[u8],
        terminated: bool,
        batch: &mut WriteBatch,
        duplicates: &mut u64,
    ) -> LineEffect {
        if line == self.config.terminate_keyword.as_bytes() {
            return LineEffect::Stop(ChunkVerdict::Shutdown);
        }

        match Token::parse(line, self.config.token_width) {
            Some(token) => {
                if shared.store.insert_if_absent(token) {
                    shared.counters.record_unique();
                    batch.push(token);
                } else {
                    shared.counters.record_duplicate();
                    *duplicates += 1;
                }
                LineEffect::Accepted
            }
            None => {
                let rejected = RejectedLine::new(line, terminated);
                LineEffect::Stop(ChunkVerdict::CloseConnection(rejected))
            }
        }
    }
}

impl IngestionApi for IngestionService {
    fn open_connection(&self, id: ConnectionId) -> ConnectionState {
        ConnectionState::new(id, &self.config)
    }

    fn ingest_chunk(&self, conn: &mut ConnectionState, chunk: &[u8]) -> ChunkOutcome {
        debug_assert!(conn.is_open(), "chunk fed to closed connection");
        self.metrics.record_chunk(chunk.len());

        let frames = conn.frame_mut().feed(chunk);
        let width = self.config.token_width;

        let mut batch = WriteBatch::new();
        let mut duplicates = 0;
        let mut effect = LineEffect::Accepted;

        {
            let mut shared = self.shared.lock();
            for line in frames.iter() {
                effect = self.ingest_line(&mut shared, line, true, &mut batch, &mut duplicates);
                if matches!(effect, LineEffect::Stop(_)) {
                    break;
                }
            }

            // Only a digit run that is still short of a token waits for the
            // next read; any other tail is judged now.
            let class = classify(conn.pending_fragment(), width, true);
            if matches!(effect, LineEffect::Accepted)
                && !conn.pending_fragment().is_empty()
                && class != TokenClass::TooShortInProgress
            {
                let tail = if class == TokenClass::Complete {
                    conn.frame_mut().take_completed()
                } else {
                    conn.frame_mut().take_pending()
                };
                effect = self.ingest_line(&mut shared, &tail, false, &mut batch, &mut duplicates);
            }
        }

        let verdict = match effect {
            LineEffect::Accepted => ChunkVerdict::Continue,
            LineEffect::Stop(verdict) => {
                // Bytes after a malformed line or the keyword on the same
                // connection are not trusted.
                conn.close();
                if matches!(verdict, ChunkVerdict::CloseConnection(_)) {
                    self.metrics.record_connection_rejected();
                }
                verdict
            }
        };

        debug_assert!(invariant_fragment_bounded(conn.pending_fragment(), &self.config));
        debug_assert!(invariant_batch_distinct(&batch));

        trace!(
            conn_id = %conn.id(),
            lines = frames.len(),
            unique = batch.len(),
            duplicates,
            pending = conn.pending_fragment().len(),
            "Chunk processed"
        );

        ChunkOutcome {
            batch,
            duplicates,
            verdict,
        }
    }

    fn take_report(&self) -> ReportSnapshot {
        let mut shared = self.shared.lock();
        let total = shared.store.len() as u64;
        let snapshot = shared.counters.take(total);
        debug!(
            unique = snapshot.unique,
            duplicates = snapshot.duplicates,
            total = snapshot.total,
            "Report counters reset"
        );
        snapshot
    }

    fn unique_total(&self) -> usize {
        self.shared.lock().store.len()
    }
}
