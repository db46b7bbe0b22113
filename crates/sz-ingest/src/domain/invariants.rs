//! # Domain Invariants
//!
//! Rules that must hold after every processed chunk.

use std::collections::HashSet;

use super::batch::WriteBatch;
use super::config::IngestConfig;
use super::report::ReportSnapshot;

/// Invariant: a connection only ever holds an all-digit run shorter than a
/// complete token between reads.
pub fn invariant_fragment_bounded(pending: &[u8], config: &IngestConfig) -> bool {
    pending.len() <= config.max_fragment_len() && pending.iter().all(u8::is_ascii_digit)
}

/// Invariant: a batch never carries the same token twice.
///
/// Each unique token is written exactly once, so a token appearing twice in
/// one batch means the dedup check was bypassed.
pub fn invariant_batch_distinct(batch: &WriteBatch) -> bool {
    let mut seen = HashSet::with_capacity(batch.len());
    batch.tokens().iter().all(|token| seen.insert(*token))
}

/// Invariant: the cumulative unique total never decreases between reports.
pub fn invariant_total_monotonic(previous: &ReportSnapshot, next: &ReportSnapshot) -> bool {
    next.total >= previous.total
}
