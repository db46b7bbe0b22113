//! # SZ Ingest
//!
//! Token ingestion core: re-frames connection byte streams into lines,
//! validates fixed-width numeric tokens, deduplicates them process-wide and
//! persists each new token exactly once.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `FrameBuffer`: Per-connection line re-framing
//!   - `Token` / `classify`: Fixed-width digit validation
//!   - `DedupStore`: Set of every token ever accepted
//!   - `ReportCounters`: Per-interval unique/duplicate counts
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `IngestionApi`: Driving port used by connection handlers
//!   - `NumberLog`: Driven port for the append-only log
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `IngestionService`: Implements `IngestionApi`
//!   - `Reporter`: Periodic report emission
//!
//! - **Adapters Layer** (`adapters/`): External connections
//!   - `FileNumberLog` / `MemoryNumberLog`: `NumberLog` backends
//!   - `LogWriter`: Single task owning the log
//!
//! ## Invariants
//!
//! - A token is written to the log at most once per process lifetime
//! - A connection never holds more than one unterminated fragment
//! - The unique total reported never decreases
//!
//! ## Usage Example
//!
//! ```
//! use sz_ingest::{ChunkVerdict, ConnectionId, IngestConfig, IngestionApi, IngestionService};
//!
//! let service = IngestionService::new(IngestConfig::default()).unwrap();
//! let mut conn = service.open_connection(ConnectionId(1));
//!
//! let outcome = service.ingest_chunk(&mut conn, b"123456789\n123456789\n");
//! assert_eq!(outcome.batch.len(), 1);
//! assert_eq!(outcome.duplicates, 1);
//! assert_eq!(outcome.verdict, ChunkVerdict::Continue);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{FileNumberLog, LogWriter, LogWriterHandle, MemoryNumberLog};
pub use domain::{ConnectionId, ConnectionState, IngestConfig, ReportSnapshot, Token, WriteBatch};
pub use error::{IngestError, LogError};
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use ports::{ChunkOutcome, ChunkVerdict, IngestionApi, NumberLog, RejectedLine};
pub use service::{IngestionService, Reporter};
