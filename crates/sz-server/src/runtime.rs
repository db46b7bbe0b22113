//! # Server Runtime
//!
//! Wires the ingestion service, the log writer, the reporter and the
//! connection manager together and drives shutdown.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration and bind the listener
//! 2. Truncate the number log and start the writer task
//! 3. Start the reporter
//! 4. Start accepting connections
//!
//! ## Shutdown Sequence
//!
//! 1. Terminate keyword, Ctrl-C or a failed append records a reason
//! 2. Stop accepting, stop the reporter, abort every connection
//! 3. On a clean reason, give queued appends a bounded grace period
//! 4. Log final metrics and return the reason

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use sz_ingest::{
    FileNumberLog, IngestError, IngestMetrics, IngestionApi, IngestionService, LogWriter,
    ReportSnapshot, Reporter,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::connection::ConnectionContext;
use crate::error::ServerError;
use crate::manager::ConnectionManager;
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// The bound, not yet running, service.
pub struct ServerRuntime {
    config: ServerConfig,
    listener: TcpListener,
    service: Arc<IngestionService>,
    metrics: Arc<IngestMetrics>,
    shutdown: ShutdownSignal,
}

impl ServerRuntime {
    /// Validate `config` and bind the listener.
    ///
    /// A bind failure is fatal at startup.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let addr = config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        let metrics = Arc::new(IngestMetrics::new());
        let service = Arc::new(IngestionService::with_metrics(
            config.ingest.clone(),
            Arc::clone(&metrics),
        )?);

        info!(
            addr = %listener.local_addr()?,
            max_connections = config.network.max_connections,
            log_file = %config.storage.log_file.display(),
            "[ServerRuntime] Listener bound"
        );

        Ok(Self {
            config,
            listener,
            service,
            metrics,
            shutdown: ShutdownSignal::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for requesting shutdown from outside (e.g. Ctrl-C).
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn service(&self) -> Arc<IngestionService> {
        Arc::clone(&self.service)
    }

    pub fn metrics(&self) -> Arc<IngestMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run until shutdown, printing reports to stdout.
    pub async fn run(self) -> Result<ShutdownReason, ServerError> {
        self.run_with_reporter(print_report).await
    }

    /// Run until shutdown, handing every report to `sink`.
    pub async fn run_with_reporter<F>(self, sink: F) -> Result<ShutdownReason, ServerError>
    where
        F: FnMut(&ReportSnapshot) + Send + 'static,
    {
        let Self {
            config,
            listener,
            service,
            metrics,
            shutdown,
        } = self;

        let (writer, mut writer_task) = LogWriter::start(
            FileNumberLog::new(&config.storage.log_file),
            config.ingest.delimiter,
            config.storage.writer_queue,
            Arc::clone(&metrics),
        )
        .await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let api: Arc<dyn IngestionApi> = service.clone();

        let reporter = tokio::spawn(Reporter::new(Arc::clone(&api)).run(
            config.reporting.interval,
            stop_rx.clone(),
            sink,
        ));

        let manager = ConnectionManager::new(config.network.max_connections, Arc::clone(&metrics));
        let ctx = ConnectionContext {
            api,
            writer: writer.clone(),
            shutdown: shutdown.clone(),
            read_buffer_bytes: config.network.read_buffer_bytes,
        };
        let acceptor = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.run_acceptor(listener, ctx, stop_rx).await })
        };

        info!("[ServerRuntime] Service running");

        let mut writer_finished = false;
        let mut reason = tokio::select! {
            reason = shutdown.wait() => reason,
            exit = &mut writer_task => {
                writer_finished = true;
                shutdown.trigger(ShutdownReason::PersistenceFailure(describe_writer_exit(exit)));
                shutdown.wait().await
            }
        };

        if reason.is_clean() {
            info!(reason = %reason, "[ServerRuntime] Shutting down");
        } else {
            error!(reason = %reason, "[ServerRuntime] Shutting down");
        }

        manager.begin_drain();
        if let Err(e) = stop_tx.send(true) {
            warn!("Failed to send stop signal: {}", e);
        }
        if let Err(e) = acceptor.await {
            warn!(error = %e, "[ServerRuntime] Acceptor ended abnormally");
        }
        let aborted = manager.abort_all();
        debug!(aborted, "[ServerRuntime] Connections aborted");
        if let Err(e) = reporter.await {
            warn!(error = %e, "[ServerRuntime] Reporter ended abnormally");
        }

        if !writer_finished {
            let grace = config.reporting.shutdown_grace;
            let mut flush_failed = false;
            if reason.is_clean() {
                match tokio::time::timeout(grace, writer.flush()).await {
                    Ok(Ok(())) => debug!("[ServerRuntime] Queued appends flushed"),
                    Ok(Err(e)) => {
                        flush_failed = true;
                        warn!(error = %e, "[ServerRuntime] Final flush failed");
                    }
                    Err(_) => warn!(
                        grace = ?grace,
                        "[ServerRuntime] Grace period elapsed, queued appends dropped"
                    ),
                }
            }

            // A failed flush means the writer died on an append; collect its error.
            if flush_failed || writer_task.is_finished() {
                if let Ok(Ok(Err(e))) = tokio::time::timeout(grace, &mut writer_task).await {
                    reason = ShutdownReason::PersistenceFailure(e.to_string());
                }
            }
            writer_task.abort();
        }
        drop(writer);

        manager.mark_stopped();
        info!(
            metrics = %metrics.snapshot(),
            unique_total = service.unique_total(),
            "[ServerRuntime] Stopped"
        );

        Ok(reason)
    }
}

fn describe_writer_exit(exit: Result<Result<(), IngestError>, JoinError>) -> String {
    match exit {
        Ok(Err(e)) => e.to_string(),
        Ok(Ok(())) => "log writer exited unexpectedly".to_string(),
        Err(e) => format!("log writer task failed: {}", e),
    }
}

/// Write one report line to stdout.
pub fn print_report(snapshot: &ReportSnapshot) {
    if let Err(e) = write_report(&mut std::io::stdout().lock(), snapshot) {
        warn!(error = %e, report = %snapshot, "[ServerRuntime] Failed to print report");
    }
}

fn write_report<W: Write>(out: &mut W, snapshot: &ReportSnapshot) -> std::io::Result<()> {
    writeln!(out, "{}", snapshot)?;
    out.flush()
}
