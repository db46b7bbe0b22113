//! Service Layer
//!
//! Contains the application services that orchestrate domain logic:
//! the per-chunk ingestion pipeline and the periodic reporter.

pub mod ingestion;
pub mod reporter;

pub use ingestion::IngestionService;
pub use reporter::Reporter;
