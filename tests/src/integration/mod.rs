//! Cross-crate flows: `sz-server` driving `sz-ingest` over real sockets.

pub mod flows;
