//! # Log Writer
//!
//! Single task that owns the [`NumberLog`] and performs every append, so
//! batches from concurrent connections never interleave inside the file.
//!
//! ```text
//! conn-1 ──┐
//! conn-2 ──┼── WriterCommand (mpsc) ──► LogWriter task ──► NumberLog
//! conn-N ──┘                                  │
//!                                             └── JoinHandle<Result<(), IngestError>>
//! ```
//!
//! The first failed append ends the task with an error. The runtime treats
//! that as fatal and shuts the service down.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::WriteBatch;
use crate::error::IngestError;
use crate::metrics::IngestMetrics;
use crate::ports::NumberLog;

/// Default capacity of the writer queue, in batches.
pub const DEFAULT_WRITER_QUEUE: usize = 1024;

enum WriterCommand {
    Append(WriteBatch),
    /// Acknowledged once every earlier command has been handled
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle used by connection tasks to submit batches.
#[derive(Clone)]
pub struct LogWriterHandle {
    tx: mpsc::Sender<WriterCommand>,
}

impl LogWriterHandle {
    /// Queue `batch` for appending. Empty batches are dropped here.
    pub async fn submit(&self, batch: WriteBatch) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.tx
            .send(WriterCommand::Append(batch))
            .await
            .map_err(|_| IngestError::WriterClosed)
    }

    /// Wait until every batch submitted before this call has been appended.
    pub async fn flush(&self) -> Result<(), IngestError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Flush(ack_tx))
            .await
            .map_err(|_| IngestError::WriterClosed)?;
        ack_rx.await.map_err(|_| IngestError::WriterClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The writer task itself.
pub struct LogWriter<L: NumberLog> {
    log: L,
    delimiter: u8,
    rx: mpsc::Receiver<WriterCommand>,
    metrics: Arc<IngestMetrics>,
}

impl<L: NumberLog + 'static> LogWriter<L> {
    /// Reset `log` and spawn the writer.
    ///
    /// The log is truncated before this returns, so the caller can start
    /// accepting connections knowing the file is empty.
    pub async fn start(
        mut log: L,
        delimiter: u8,
        capacity: usize,
        metrics: Arc<IngestMetrics>,
    ) -> Result<(LogWriterHandle, JoinHandle<Result<(), IngestError>>), IngestError> {
        log.reset().await?;
        info!(log = %log.describe(), "[LogWriter] Number log ready");

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = Self {
            log,
            delimiter,
            rx,
            metrics,
        };
        let task = tokio::spawn(writer.run());

        Ok((LogWriterHandle { tx }, task))
    }

    async fn run(mut self) -> Result<(), IngestError> {
        while let Some(command) = self.rx.recv().await {
            match command {
                WriterCommand::Append(batch) => {
                    let bytes = batch.encode(self.delimiter);
                    if let Err(e) = self.log.append(&bytes).await {
                        error!(
                            log = %self.log.describe(),
                            tokens = batch.len(),
                            error = %e,
                            "[LogWriter] Append failed, stopping writer"
                        );
                        return Err(e.into());
                    }
                    self.metrics.record_batch_persisted(batch.len());
                    debug!(tokens = batch.len(), "[LogWriter] Batch appended");
                }
                WriterCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }

        debug!("[LogWriter] All handles dropped, exiting");
        Ok(())
    }
}
