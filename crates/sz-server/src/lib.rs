//! # SZ Server
//!
//! TCP front end for the serializator: accepts up to a fixed number of
//! concurrent connections, feeds their bytes to the ingestion service and
//! stops the whole process on the terminate keyword, Ctrl-C or a failed log
//! append.
//!
//! ## Modules
//!
//! - `config/` - `ServerConfig` and its sections
//! - `connection/` - Per-connection read loop
//! - `manager/` - Accept loop, concurrency cap, connection registry
//! - `runtime/` - Startup and shutdown orchestration
//! - `shutdown/` - Service-wide shutdown signal

pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod runtime;
pub mod shutdown;

pub use config::{ConfigError, NetworkConfig, ReportingConfig, ServerConfig, StorageConfig};
pub use connection::{ConnectionContext, ConnectionEnd};
pub use error::ServerError;
pub use manager::{ConnectionManager, ManagerState};
pub use runtime::ServerRuntime;
pub use shutdown::{ShutdownReason, ShutdownSignal};
