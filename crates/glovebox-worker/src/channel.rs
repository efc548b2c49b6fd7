//! Message channel to the parent process.
//!
//! Outbound events go to stdout as newline-delimited JSON; inbound control
//! messages arrive on stdin (read by the dispatch loop). Diagnostics go to
//! stderr, so the channel stays clean. The channel only exists when the
//! parent spawned this process as a linked child; anything else is a
//! deployment error and fatal.

use glovebox_core::protocol::{EventSink, WorkerEvent};
use std::env;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, error};

/// Set by the parent to mark this process as channel-linked.
pub const CHANNEL_ENV_VAR: &str = "GLOVEBOX_CHANNEL";

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("not running as a linked child process (GLOVEBOX_CHANNEL is unset), closing")]
    NotLinked,

    #[error("unsupported channel transport: {0}")]
    Unsupported(String),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write message: {0}")]
    Io(#[from] io::Error),
}

/// Fire-and-forget sender for parent-bound events.
///
/// Writes are serialized under a mutex, so events hit the wire in emission
/// order. No retry, no buffering, no acknowledgment.
pub struct MessageChannel<W: Write + Send = io::Stdout> {
    writer: Mutex<W>,
}

impl MessageChannel<io::Stdout> {
    /// Build the channel from the environment the parent set up.
    ///
    /// Fails with [`ChannelError::NotLinked`] when the marker variable is
    /// absent - this worker is only ever meant to run as a spawned child,
    /// so the caller is expected to terminate the process.
    pub fn from_env() -> Result<Self, ChannelError> {
        Self::from_transport(env::var(CHANNEL_ENV_VAR).ok().as_deref())
    }

    fn from_transport(transport: Option<&str>) -> Result<Self, ChannelError> {
        match transport {
            Some("stdio") => Ok(Self::over(io::stdout())),
            Some(other) => Err(ChannelError::Unsupported(other.to_string())),
            None => Err(ChannelError::NotLinked),
        }
    }
}

impl<W: Write + Send> MessageChannel<W> {
    /// Build a channel over an arbitrary writer.
    pub fn over(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Deliver one event as a JSON line, synchronously.
    pub fn send(&self, event: &WorkerEvent) -> Result<(), ChannelError> {
        let line = serde_json::to_string(event)?;
        debug!(%line, "sending parent message");

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Consume the channel and return its writer. Used by tests to inspect
    /// captured output.
    #[allow(dead_code)]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for MessageChannel<W> {
    fn emit(&self, event: WorkerEvent) {
        if let Err(err) = self.send(&event) {
            error!(%err, "failed to deliver event to parent");
        }
    }
}
