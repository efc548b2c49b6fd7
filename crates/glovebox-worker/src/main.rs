//! Glovebox worker binary.
//!
//! Runs as a spawned child of a supervising parent: control messages in on
//! stdin, lifecycle events out on stdout, diagnostics on stderr. Without a
//! parent-established channel the process refuses to start.

mod channel;
mod dispatch;

use channel::MessageChannel;
use glovebox_core::config::WorkerConfig;
use glovebox_core::error::WorkerError;
use std::sync::Arc;
use tracing::info;

/// Initialize tracing subscriber for logging.
///
/// Logs go to stderr: stdout belongs to the message channel.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,glovebox=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), WorkerError> {
    init_tracing();

    info!("Starting glovebox worker v{}", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::load_with_env()?;
    let channel = MessageChannel::from_env()
        .map_err(|e| WorkerError::Channel(e.to_string()))?;

    dispatch::run_loop(config, Arc::new(channel)).await
}
