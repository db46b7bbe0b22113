//! # Serializator Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for the ingestion pipeline
//! └── src/
//!     └── integration/  # End-to-end flows against a real listener
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sz-tests
//!
//! # Benchmarks
//! cargo bench -p sz-tests
//! ```

pub mod integration;
