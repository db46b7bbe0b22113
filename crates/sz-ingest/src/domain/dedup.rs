//! Dedup store
//!
//! The set of every token accepted as unique since the service started. It
//! only grows; nothing is ever evicted or reset.

use std::collections::HashSet;

use super::token::Token;

/// Process-lifetime set of accepted tokens.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: HashSet<Token>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `token` if it was never seen.
    ///
    /// Returns `true` when the token is new. Check and insert are one
    /// operation so a token can never be accepted twice.
    pub fn insert_if_absent(&mut self, token: Token) -> bool {
        self.seen.insert(token)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.seen.contains(token)
    }

    /// Number of distinct tokens ever accepted
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
