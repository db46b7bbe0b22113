//! Per-connection task
//!
//! Reads raw chunks from one socket, runs them through the ingestion API and
//! forwards every batch to the log writer before acting on the verdict.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use sz_ingest::{ChunkVerdict, ConnectionId, IngestionApi, LogWriterHandle, RejectedLine};
use sz_telemetry::log_conn_event;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Everything a connection task needs, cloned once per accepted socket.
#[derive(Clone)]
pub struct ConnectionContext {
    pub api: Arc<dyn IngestionApi>,
    pub writer: LogWriterHandle,
    pub shutdown: ShutdownSignal,
    pub read_buffer_bytes: usize,
}

/// How a connection task ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// Peer closed its side
    PeerClosed,
    /// A malformed line destroyed the connection
    Rejected(RejectedLine),
    /// The terminate keyword arrived on this connection
    ShutdownRequested,
    /// The log writer is gone; shutdown was requested
    WriterUnavailable,
    /// Reading from the socket failed
    ReadFailed(String),
}

/// Serve one socket until it closes, misbehaves or stops the service.
///
/// Generic over the stream so tests can drive it with an in-memory duplex.
pub async fn handle_connection<S>(
    ctx: ConnectionContext,
    id: ConnectionId,
    peer: SocketAddr,
    mut stream: S,
) -> ConnectionEnd
where
    S: AsyncRead + Unpin,
{
    let mut conn = ctx.api.open_connection(id);
    let mut buf = BytesMut::with_capacity(ctx.read_buffer_bytes.max(1));

    let end = loop {
        buf.clear();
        match stream.read_buf(&mut buf).await {
            Ok(0) => break ConnectionEnd::PeerClosed,
            Ok(_) => {}
            Err(e) => break ConnectionEnd::ReadFailed(e.to_string()),
        }

        let outcome = ctx.api.ingest_chunk(&mut conn, &buf);

        // The batch goes out even when the verdict stops this connection, so
        // every token inserted into the store reaches the log.
        if let Err(e) = ctx.writer.submit(outcome.batch).await {
            log_conn_event!(error, id, peer, "Log writer unavailable", error = %e);
            ctx.shutdown
                .trigger(ShutdownReason::PersistenceFailure(e.to_string()));
            break ConnectionEnd::WriterUnavailable;
        }

        match outcome.verdict {
            ChunkVerdict::Continue => {}
            ChunkVerdict::CloseConnection(rejected) => {
                break ConnectionEnd::Rejected(rejected);
            }
            ChunkVerdict::Shutdown => {
                ctx.shutdown.trigger(ShutdownReason::TerminateKeyword);
                break ConnectionEnd::ShutdownRequested;
            }
        }
    };

    if !conn.pending_fragment().is_empty() {
        log_conn_event!(
            debug,
            id,
            peer,
            "Discarding unterminated fragment",
            bytes = conn.pending_fragment().len()
        );
    }

    match &end {
        ConnectionEnd::PeerClosed => log_conn_event!(debug, id, peer, "Connection closed by peer"),
        ConnectionEnd::Rejected(line) => {
            log_conn_event!(warn, id, peer, "Malformed line, destroying connection", reason = %line)
        }
        ConnectionEnd::ShutdownRequested => {
            log_conn_event!(info, id, peer, "Terminate keyword received")
        }
        ConnectionEnd::WriterUnavailable => {}
        ConnectionEnd::ReadFailed(e) => {
            log_conn_event!(warn, id, peer, "Read failed", error = %e)
        }
    }

    end
}
