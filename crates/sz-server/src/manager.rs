//! Connection manager
//!
//! Accepts sockets up to a concurrency cap and keeps a registry of the tasks
//! serving them so shutdown can abort every one.
//!
//! ```text
//! Stopped ──run_acceptor──► Listening ──begin_drain──► Draining ──mark_stopped──► Stopped
//! ```
//!
//! The cap is enforced before `accept`: while every slot is taken the
//! listener is not polled, so extra clients wait in the kernel backlog.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sz_ingest::{ConnectionId, IngestMetrics};
use sz_telemetry::log_conn_event;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::connection::{handle_connection, ConnectionContext};

/// Lifecycle of the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Stopped,
    Listening,
    Draining,
}

/// Tracks live connection tasks.
#[derive(Clone)]
pub struct ConnectionManager {
    connections: Arc<Mutex<HashMap<ConnectionId, JoinHandle<()>>>>,
    state: Arc<Mutex<ManagerState>>,
    slots: Arc<Semaphore>,
    next_id: Arc<AtomicU64>,
    metrics: Arc<IngestMetrics>,
}

impl ConnectionManager {
    pub fn new(max_connections: usize, metrics: Arc<IngestMetrics>) -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            state: Arc::new(Mutex::new(ManagerState::Stopped)),
            slots: Arc::new(Semaphore::new(max_connections)),
            next_id: Arc::new(AtomicU64::new(1)),
            metrics,
        }
    }

    pub fn state(&self) -> ManagerState {
        *self.state.lock()
    }

    /// Get count of active connections
    pub fn active_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Connection slots currently free
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Accept connections until `stop` flips or the manager starts draining.
    ///
    /// Accept errors are logged and accepting continues.
    pub async fn run_acceptor(
        &self,
        listener: TcpListener,
        ctx: ConnectionContext,
        mut stop: watch::Receiver<bool>,
    ) {
        *self.state.lock() = ManagerState::Listening;
        info!(
            addr = ?listener.local_addr().ok(),
            slots = self.available_slots(),
            "[ConnectionManager] Listening"
        );

        loop {
            let permit = tokio::select! {
                permit = Arc::clone(&self.slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // Closed by begin_drain
                    Err(_) => break,
                },
                _ = stop.changed() => break,
            };

            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = stop.changed() => break,
            };

            match accepted {
                Ok((stream, peer)) => self.spawn_connection(permit, stream, peer, ctx.clone()),
                Err(e) => warn!(error = %e, "[ConnectionManager] Accept failed"),
            }
        }

        info!("[ConnectionManager] Acceptor stopped");
    }

    fn spawn_connection(
        &self,
        permit: OwnedSemaphorePermit,
        stream: TcpStream,
        peer: SocketAddr,
        ctx: ConnectionContext,
    ) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.metrics.record_connection_opened();
        log_conn_event!(
            info,
            id,
            peer,
            "Connection accepted",
            free_slots = self.available_slots()
        );

        let registry = Arc::clone(&self.connections);
        let metrics = Arc::clone(&self.metrics);

        // Hold the registry lock across spawn so the task cannot try to
        // remove itself before it is inserted.
        let mut connections = self.connections.lock();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            handle_connection(ctx, id, peer, stream).await;
            if registry.lock().remove(&id).is_some() {
                metrics.record_connection_closed();
            }
        });
        connections.insert(id, handle);
    }

    /// Stop handing out connection slots.
    pub fn begin_drain(&self) {
        *self.state.lock() = ManagerState::Draining;
        self.slots.close();
    }

    /// Abort all active connections. Returns how many were aborted.
    pub fn abort_all(&self) -> usize {
        let drained: Vec<_> = self.connections.lock().drain().collect();
        for (id, handle) in &drained {
            handle.abort();
            self.metrics.record_connection_closed();
            tracing::debug!(conn_id = %id, "[ConnectionManager] Connection aborted");
        }
        drained.len()
    }

    pub fn mark_stopped(&self) {
        *self.state.lock() = ManagerState::Stopped;
    }
}
