//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Token validation
//! - Per-connection stream re-framing
//! - The process-wide dedup store
//! - Report counters and write batches
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod batch;
pub mod config;
pub mod connection;
pub mod dedup;
pub mod frame;
pub mod invariants;
pub mod report;
pub mod token;

pub use batch::WriteBatch;
pub use config::{
    IngestConfig, DEFAULT_DELIMITER, DEFAULT_TERMINATE_KEYWORD, DEFAULT_TOKEN_WIDTH, MAX_TOKEN_WIDTH,
};
pub use connection::{ConnectionId, ConnectionState};
pub use dedup::DedupStore;
pub use frame::{FrameBuffer, Frames};
pub use report::{ReportCounters, ReportSnapshot};
pub use token::{classify, Token, TokenClass};
