//! Adapters Layer
//!
//! Concrete number logs and the single writer task that serializes appends.

pub mod file_log;
pub mod memory_log;
pub mod writer;

pub use file_log::FileNumberLog;
pub use memory_log::MemoryNumberLog;
pub use writer::{LogWriter, LogWriterHandle, DEFAULT_WRITER_QUEUE};
