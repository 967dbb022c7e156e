//! Watchdesk forwarder.
//!
//! Thin relay between an agent alerts file and the ingest API: tails the
//! file from its end and POSTs each complete line as-is. No parsing, no
//! buffering beyond the current line, no retry — a failed send is logged
//! and the relay moves on to the next line.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader, SeekFrom};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wd-forwarder")]
#[command(version)]
#[command(about = "Forwards agent alert lines to the Watchdesk ingest API", long_about = None)]
struct Args {
    /// Alerts file to tail.
    #[arg(long, env = "WATCHDESK_ALERTS_FILE", default_value = "/var/ossec/logs/alerts/alerts.json")]
    file: PathBuf,

    /// Ingest endpoint to POST lines to.
    #[arg(long, env = "WATCHDESK_INGEST_URL", default_value = "http://localhost:8080/api/logs")]
    endpoint: String,

    /// Poll interval while the file has no new data, in milliseconds.
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(file = %args.file.display(), endpoint = %args.endpoint, "Forwarder starting");

    let file = File::open(&args.file)
        .await
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let mut reader = BufReader::new(file);

    // Start at the end: only lines written after startup are forwarded.
    reader
        .seek(SeekFrom::End(0))
        .await
        .context("failed to seek to end of alerts file")?;

    let client = reqwest::Client::new();
    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    let mut pending = String::new();

    loop {
        let read = reader
            .read_line(&mut pending)
            .await
            .context("failed to read alerts file")?;

        if read == 0 {
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        // A line without a trailing newline is still being written; keep
        // accumulating until the writer finishes it.
        if !pending.ends_with('\n') {
            continue;
        }

        let line = pending.trim();
        if !line.is_empty() {
            forward_line(&client, &args.endpoint, line).await;
        }
        pending.clear();
    }
}

async fn forward_line(client: &reqwest::Client, endpoint: &str, line: &str) {
    let result = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .body(line.to_string())
        .send()
        .await;

    match result {
        Ok(response) => {
            info!(status = %response.status(), "Forwarded alert line");
        }
        Err(e) => {
            warn!(error = %e, "Failed to forward alert line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["wd-forwarder"]).unwrap();
        assert_eq!(args.endpoint, "http://localhost:8080/api/logs");
        assert_eq!(args.poll_interval_ms, 500);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "wd-forwarder",
            "--file",
            "/tmp/alerts.json",
            "--endpoint",
            "http://siem:8080/api/logs",
            "--poll-interval-ms",
            "100",
        ])
        .unwrap();
        assert_eq!(args.file, PathBuf::from("/tmp/alerts.json"));
        assert_eq!(args.endpoint, "http://siem:8080/api/logs");
        assert_eq!(args.poll_interval_ms, 100);
    }
}
