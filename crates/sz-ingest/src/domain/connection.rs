//! Connection state
//!
//! One instance per live socket, owned by the task serving that socket.

use std::fmt;

use super::config::IngestConfig;
use super::frame::FrameBuffer;

/// Identifier of an accepted connection, unique for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection ingestion state.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    id: ConnectionId,
    frame: FrameBuffer,
    open: bool,
}

impl ConnectionState {
    pub fn new(id: ConnectionId, config: &IngestConfig) -> Self {
        Self {
            id,
            frame: FrameBuffer::new(config),
            open: true,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Unterminated bytes carried into the next read
    pub fn pending_fragment(&self) -> &[u8] {
        self.frame.pending()
    }

    pub(crate) fn frame_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    /// Mark the connection closed; any held fragment is discarded.
    pub fn close(&mut self) {
        self.open = false;
        self.frame.clear();
    }
}
