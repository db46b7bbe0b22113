//! Service-wide shutdown signal
//!
//! Any task may request shutdown; the first reason wins and later requests
//! are ignored.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Why the service stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A client sent the terminate keyword
    TerminateKeyword,
    /// An append to the number log failed
    PersistenceFailure(String),
    /// The process received Ctrl-C
    Interrupted,
}

impl ShutdownReason {
    /// Process exit status for this reason.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::TerminateKeyword | ShutdownReason::Interrupted => 0,
            ShutdownReason::PersistenceFailure(_) => 1,
        }
    }

    /// Whether queued appends should still be given a chance to land.
    pub fn is_clean(&self) -> bool {
        !matches!(self, ShutdownReason::PersistenceFailure(_))
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::TerminateKeyword => write!(f, "terminate keyword received"),
            ShutdownReason::PersistenceFailure(e) => write!(f, "persistence failure: {}", e),
            ShutdownReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Cloneable trigger/listener pair over a watch channel.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns `false` if a reason was already recorded.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    /// Recorded reason, if shutdown was requested
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.tx.borrow().clone()
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = rx.borrow_and_update().clone() {
                return reason;
            }
            // The sender lives as long as `self`, so this cannot fail.
            let _ = rx.changed().await;
        }
    }
}
