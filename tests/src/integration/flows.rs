//! # Integration Test Flows
//!
//! Each test binds a server on an ephemeral port with its number log in a
//! temporary directory, drives it with plain TCP clients and inspects the
//! log file, the report counters and the shutdown reason.
//!
//! Tests that need final counters end the run with the terminate keyword on
//! the same connection that carried the data, so every earlier line has been
//! processed before shutdown begins.

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use sz_ingest::{IngestionApi, IngestionService, ReportSnapshot};
    use sz_server::{ServerConfig, ServerError, ServerRuntime, ShutdownReason};
    use tempfile::{tempdir, TempDir};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct TestServer {
        addr: SocketAddr,
        log_file: PathBuf,
        service: Arc<IngestionService>,
        reports: Arc<Mutex<Vec<ReportSnapshot>>>,
        handle: JoinHandle<Result<ShutdownReason, ServerError>>,
        signal: sz_server::ShutdownSignal,
        _dir: TempDir,
    }

    impl TestServer {
        async fn start() -> Self {
            Self::start_with(|_| {}).await
        }

        async fn start_with(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
            let dir = tempdir().unwrap();
            let mut config = ServerConfig::default();
            config.network.host = "127.0.0.1".to_string();
            config.network.port = 0;
            config.storage.log_file = dir.path().join("numbers.log");
            adjust(&mut config);

            let log_file = config.storage.log_file.clone();
            let runtime = ServerRuntime::bind(config).await.unwrap();
            let addr = runtime.local_addr().unwrap();
            let service = runtime.service();
            let signal = runtime.shutdown_signal();

            let reports = Arc::new(Mutex::new(Vec::new()));
            let sink = {
                let reports = Arc::clone(&reports);
                move |snapshot: &ReportSnapshot| reports.lock().push(*snapshot)
            };
            let handle = tokio::spawn(runtime.run_with_reporter(sink));

            Self {
                addr,
                log_file,
                service,
                reports,
                handle,
                signal,
                _dir: dir,
            }
        }

        async fn connect(&self) -> TcpStream {
            TcpStream::connect(self.addr).await.unwrap()
        }

        async fn finish(self) -> (ShutdownReason, TestOutcome) {
            let reason = timeout(Duration::from_secs(10), self.handle)
                .await
                .expect("server did not stop")
                .unwrap()
                .unwrap();
            let outcome = TestOutcome {
                log: read_log(&self.log_file),
                report: self.service.take_report(),
                reports: self.reports.lock().clone(),
            };
            (reason, outcome)
        }
    }

    struct TestOutcome {
        log: String,
        report: ReportSnapshot,
        reports: Vec<ReportSnapshot>,
    }

    fn read_log(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// Read until the server closes the socket.
    async fn expect_closed(stream: &mut TcpStream) {
        let mut buf = [0u8; 16];
        let closed = timeout(Duration::from_secs(5), async {
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "server kept the connection open");
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_single_token_is_logged() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client.write_all(b"123456789\nterminate\n").await.unwrap();

        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        assert_eq!(outcome.log, "123456789\n");
        assert_eq!(
            (outcome.report.unique, outcome.report.duplicates, outcome.report.total),
            (1, 0, 1)
        );
    }

    #[tokio::test]
    async fn test_duplicate_is_logged_once() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client
            .write_all(b"123456789\n123456789\nterminate\n")
            .await
            .unwrap();

        let (_, outcome) = server.finish().await;
        assert_eq!(outcome.log, "123456789\n");
        assert_eq!(
            (outcome.report.unique, outcome.report.duplicates, outcome.report.total),
            (1, 1, 1)
        );
    }

    #[tokio::test]
    async fn test_token_split_across_writes() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client.write_all(b"123456789\n111").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(b"111111\nterminate\n").await.unwrap();

        let (_, outcome) = server.finish().await;
        assert_eq!(outcome.log, "123456789\n111111111\n");
    }

    #[tokio::test]
    async fn test_terminate_closes_listener() {
        let server = TestServer::start().await;
        let addr = server.addr;
        let mut client = server.connect().await;
        client.write_all(b"terminate\n").await.unwrap();

        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        assert_eq!(outcome.log, "");
        assert_eq!(outcome.report.total, 0);
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_unterminated_keyword_at_eof() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client.write_all(b"terminate").await.unwrap();

        let (reason, _) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
    }

    #[tokio::test]
    async fn test_short_fragment_is_dropped_when_client_leaves() {
        let server = TestServer::start().await;
        let metrics = server.service.metrics();

        let mut partial = server.connect().await;
        partial.write_all(b"1234").await.unwrap();
        drop(partial);
        wait_until(|| metrics.snapshot().connections_closed >= 1).await;

        let mut closer = server.connect().await;
        closer.write_all(b"terminate\n").await.unwrap();

        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        assert_eq!(outcome.log, "");
        assert_eq!(outcome.report.total, 0);
    }

    #[tokio::test]
    async fn test_unterminated_token_is_logged_when_client_leaves() {
        let server = TestServer::start().await;
        let metrics = server.service.metrics();

        let mut client = server.connect().await;
        client.write_all(b"123456789").await.unwrap();
        drop(client);
        wait_until(|| metrics.snapshot().connections_closed >= 1).await;

        let mut closer = server.connect().await;
        closer.write_all(b"terminate\n").await.unwrap();

        let (_, outcome) = server.finish().await;
        assert_eq!(outcome.log, "123456789\n");
        assert_eq!(outcome.report.total, 1);
    }

    #[tokio::test]
    async fn test_stray_tail_closes_connection() {
        let server = TestServer::start().await;
        let mut stray = server.connect().await;
        stray.write_all(b"t").await.unwrap();
        expect_closed(&mut stray).await;

        server.signal.trigger(ShutdownReason::Interrupted);
        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::Interrupted);
        assert_eq!(outcome.log, "");
    }

    #[tokio::test]
    async fn test_malformed_line_closes_only_that_connection() {
        let server = TestServer::start().await;
        let mut good = server.connect().await;
        let mut bad = server.connect().await;

        bad.write_all(b"abc\n").await.unwrap();
        expect_closed(&mut bad).await;

        good.write_all(b"111111111\nterminate\n").await.unwrap();
        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        assert_eq!(outcome.log, "111111111\n");
        assert_eq!(outcome.report.unique, 1);
    }

    #[tokio::test]
    async fn test_tokens_before_malformed_line_are_kept() {
        let server = TestServer::start().await;
        let mut bad = server.connect().await;
        bad.write_all(b"222222222\n12345\n333333333\n")
            .await
            .unwrap();
        expect_closed(&mut bad).await;

        let mut closer = server.connect().await;
        closer.write_all(b"terminate\n").await.unwrap();

        let (_, outcome) = server.finish().await;
        assert_eq!(outcome.log, "222222222\n");
        assert_eq!(outcome.report.total, 1);
    }

    #[tokio::test]
    async fn test_oversized_and_empty_lines_are_malformed() {
        let server = TestServer::start().await;

        let mut oversized = server.connect().await;
        oversized.write_all(b"1234567890\n").await.unwrap();
        expect_closed(&mut oversized).await;

        let mut empty = server.connect().await;
        empty.write_all(b"\n").await.unwrap();
        expect_closed(&mut empty).await;

        server.signal.trigger(ShutdownReason::Interrupted);
        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::Interrupted);
        assert_eq!(outcome.log, "");
    }

    #[tokio::test]
    async fn test_crlf_lines_are_accepted() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client
            .write_all(b"123456789\r\n987654321\r\nterminate\r\n")
            .await
            .unwrap();

        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        assert_eq!(outcome.log, "123456789\n987654321\n");
    }

    #[tokio::test]
    async fn test_leading_zeros_survive() {
        let server = TestServer::start().await;
        let mut client = server.connect().await;
        client
            .write_all(b"000000001\n000000001\nterminate\n")
            .await
            .unwrap();

        let (_, outcome) = server.finish().await;
        assert_eq!(outcome.log, "000000001\n");
        assert_eq!(outcome.report.duplicates, 1);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test]
    async fn test_overlapping_clients_log_each_token_once() {
        let server = TestServer::start().await;

        let mut writers = Vec::new();
        for client_idx in 0..4u64 {
            let mut stream = server.connect().await;
            writers.push(tokio::spawn(async move {
                // Ranges overlap by half with the next client.
                let start = 100_000_000 + client_idx * 50;
                let mut payload = Vec::new();
                for value in start..start + 100 {
                    payload.extend_from_slice(format!("{}\n", value).as_bytes());
                }
                stream.write_all(&payload).await.unwrap();
                stream.shutdown().await.unwrap();
            }));
        }
        for writer in writers {
            writer.await.unwrap();
        }

        // 4 clients x 100 values, overlapping by 50: 250 distinct.
        let service = Arc::clone(&server.service);
        wait_until(|| service.unique_total() == 250).await;

        let mut closer = server.connect().await;
        closer.write_all(b"terminate\n").await.unwrap();
        let (_, outcome) = server.finish().await;

        let mut lines: Vec<&str> = outcome.log.lines().collect();
        assert_eq!(lines.len(), 250);
        lines.sort_unstable();
        lines.dedup();
        assert_eq!(lines.len(), 250, "a token was logged twice");
        assert_eq!(outcome.report.unique, 250);
        assert_eq!(outcome.report.duplicates, 150);
    }

    #[tokio::test]
    async fn test_sixth_client_waits_for_a_free_slot() {
        let server = TestServer::start().await;

        let mut idle = Vec::new();
        for _ in 0..5 {
            idle.push(server.connect().await);
        }

        // Connects at the TCP level but is not served yet.
        let mut waiting = server.connect().await;
        waiting.write_all(b"222222222\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(server.service.unique_total(), 0);

        drop(idle.pop());
        let service = Arc::clone(&server.service);
        wait_until(|| service.unique_total() == 1).await;

        server.signal.trigger(ShutdownReason::Interrupted);
        let (reason, outcome) = server.finish().await;
        assert_eq!(reason, ShutdownReason::Interrupted);
        assert_eq!(outcome.log, "222222222\n");
    }

    #[tokio::test]
    async fn test_shutdown_aborts_idle_connections() {
        let server = TestServer::start().await;
        let mut idle = server.connect().await;
        let mut closer = server.connect().await;

        closer.write_all(b"terminate\n").await.unwrap();
        let (reason, _) = server.finish().await;
        assert_eq!(reason, ShutdownReason::TerminateKeyword);
        expect_closed(&mut idle).await;
    }

    // =============================================================================
    // REPORTING & STARTUP
    // =============================================================================

    #[tokio::test]
    async fn test_reports_reset_between_intervals() {
        let server = TestServer::start_with(|config| {
            config.reporting.interval = Duration::from_millis(100);
        })
        .await;

        let mut client = server.connect().await;
        client
            .write_all(b"111111111\n222222222\n111111111\n")
            .await
            .unwrap();

        let reports = Arc::clone(&server.reports);
        wait_until(|| {
            let reports = reports.lock();
            reports.iter().map(|r| r.unique).sum::<u64>() == 2
                && reports.iter().map(|r| r.duplicates).sum::<u64>() == 1
        })
        .await;
        let seen = reports.lock().len();
        wait_until(|| reports.lock().len() > seen).await;

        server.signal.trigger(ShutdownReason::Interrupted);
        let (_, outcome) = server.finish().await;

        let unique: u64 = outcome.reports.iter().map(|r| r.unique).sum();
        let duplicates: u64 = outcome.reports.iter().map(|r| r.duplicates).sum();
        assert_eq!(unique, 2);
        assert_eq!(duplicates, 1);

        let last = outcome.reports.last().unwrap();
        assert_eq!((last.unique, last.duplicates, last.total), (0, 0, 2));
        assert!(outcome
            .reports
            .windows(2)
            .all(|pair| pair[0].total <= pair[1].total));
        assert_eq!(
            last.to_string(),
            "Received 0 unique numbers, 0 duplicates. Unique total: 2."
        );
    }

    #[tokio::test]
    async fn test_previous_log_is_truncated() {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("numbers.log");
        std::fs::write(&log_file, "999999999\n").unwrap();

        let mut config = ServerConfig::default();
        config.network.host = "127.0.0.1".to_string();
        config.network.port = 0;
        config.storage.log_file = log_file.clone();

        let runtime = ServerRuntime::bind(config).await.unwrap();
        let addr = runtime.local_addr().unwrap();
        let handle = tokio::spawn(runtime.run_with_reporter(|_| {}));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"999999999\nterminate\n").await.unwrap();
        timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(read_log(&log_file), "999999999\n");
    }

    #[tokio::test]
    async fn test_unwritable_log_fails_startup() {
        let dir = tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.network.host = "127.0.0.1".to_string();
        config.network.port = 0;
        // A directory cannot be truncated as a file.
        config.storage.log_file = dir.path().to_path_buf();

        let runtime = ServerRuntime::bind(config).await.unwrap();
        let result = runtime.run_with_reporter(|_| {}).await;
        assert!(matches!(result, Err(ServerError::Ingest(_))));
    }
}
