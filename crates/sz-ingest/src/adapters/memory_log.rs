//! In-memory number log
//!
//! Used by tests and dry runs. Clones share the same buffer, so a test can
//! keep a handle while the writer task owns another.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LogError;
use crate::ports::NumberLog;

#[derive(Debug, Default)]
struct MemoryLogState {
    contents: Vec<u8>,
    appends: usize,
    resets: usize,
    fail_appends: Option<String>,
}

/// Shared in-memory log with failure injection.
#[derive(Clone, Debug, Default)]
pub struct MemoryNumberLog {
    state: Arc<Mutex<MemoryLogState>>,
}

impl MemoryNumberLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended since the last reset
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().contents.clone()
    }

    /// Contents split into lines, without delimiters
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.state.lock().contents)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Number of successful appends since the last reset
    pub fn append_count(&self) -> usize {
        self.state.lock().appends
    }

    pub fn reset_count(&self) -> usize {
        self.state.lock().resets
    }

    /// Make every following append fail with `reason`.
    pub fn fail_appends(&self, reason: impl Into<String>) {
        self.state.lock().fail_appends = Some(reason.into());
    }
}

#[async_trait]
impl NumberLog for MemoryNumberLog {
    async fn reset(&mut self) -> Result<(), LogError> {
        let mut state = self.state.lock();
        state.contents.clear();
        state.appends = 0;
        state.resets += 1;
        Ok(())
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), LogError> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_appends {
            return Err(LogError::Injected(reason.clone()));
        }
        state.contents.extend_from_slice(bytes);
        state.appends += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
