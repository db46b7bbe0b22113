//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API used by the connection handlers
//! - Driven Ports (outbound) - the append-only number log

pub mod inbound;
pub mod outbound;

pub use inbound::{ChunkOutcome, ChunkVerdict, IngestionApi, RejectedLine};
pub use outbound::NumberLog;
