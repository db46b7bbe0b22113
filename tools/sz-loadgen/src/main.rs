//! SZ-Loadgen: streams a range of 9-digit numbers to a serializator server.
//!
//! Opens one connection, writes `start..end` one number per line, optionally
//! repeats the range to produce duplicates, optionally sends the terminate
//! keyword last, then disconnects.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::info;

use sz_telemetry::{init_telemetry, TelemetryConfig};

/// Log progress every this many numbers.
const PROGRESS_EVERY: u64 = 1_000_000;

/// SZ-Loadgen: serializator load generator
#[derive(Parser, Debug)]
#[command(name = "sz-loadgen")]
#[command(about = "Streams 9-digit numbers to a serializator server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:4000")]
    addr: String,

    /// First number sent (inclusive)
    #[arg(long, default_value = "111111111")]
    start: u64,

    /// Last number sent (exclusive)
    #[arg(long, default_value = "121111111")]
    end: u64,

    /// Send the whole range this many times
    #[arg(short, long, default_value = "1")]
    repeat: u32,

    /// Send the terminate keyword after the last number
    #[arg(long)]
    terminate: bool,

    /// Keyword sent with --terminate
    #[arg(long, default_value = "terminate")]
    keyword: String,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            bail!("start ({}) must be below end ({})", self.start, self.end);
        }
        if self.start < 100_000_000 || self.end > 1_000_000_000 {
            bail!("range must stay within 9-digit numbers");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    let _guard = init_telemetry(&TelemetryConfig::from_env())
        .context("Failed to initialize logging")?;

    let stream = TcpStream::connect(&args.addr)
        .await
        .with_context(|| format!("Failed to connect to {}", args.addr))?;
    info!(addr = %args.addr, "Connected to serializator");

    let per_pass = args.end - args.start;
    info!(
        numbers = per_pass,
        passes = args.repeat,
        "Starting to send"
    );

    let started = Instant::now();
    let mut writer = BufWriter::new(stream);
    let mut sent: u64 = 0;
    let mut line = String::with_capacity(10);

    for pass in 0..args.repeat {
        for number in args.start..args.end {
            line.clear();
            line.push_str(&number.to_string());
            line.push('\n');
            writer
                .write_all(line.as_bytes())
                .await
                .context("Write failed")?;

            sent += 1;
            if sent % PROGRESS_EVERY == 0 {
                info!(sent, pass, "Progress");
            }
        }
    }

    if args.terminate {
        writer
            .write_all(format!("{}\n", args.keyword).as_bytes())
            .await
            .context("Write failed")?;
    }

    writer.flush().await.context("Flush failed")?;
    writer.shutdown().await.context("Shutdown failed")?;

    info!(
        sent,
        elapsed_ms = started.elapsed().as_millis() as u64,
        terminated = args.terminate,
        "Done"
    );
    Ok(())
}
