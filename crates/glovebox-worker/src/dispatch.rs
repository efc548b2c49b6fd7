//! Dispatch loop: routes parent commands into the session pipeline.
//!
//! Exactly one `start` is accepted per process lifetime. A `start` that
//! arrives while a session exists (running or finished) is rejected with an
//! `error` event; every other inbound event is silently ignored. There is
//! no terminal state - once work is done the worker idles until the parent
//! tears it down.

use crate::channel::MessageChannel;
use glovebox_browser::{Session, SessionLauncher};
use glovebox_core::config::WorkerConfig;
use glovebox_core::error::{Result, WorkerError};
use glovebox_core::protocol::{ControlMessage, EventSink, LaunchRequest, WorkerEvent};
use glovebox_sandbox::SandboxRunner;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// What the dispatch loop does with one inbound message.
#[derive(Debug)]
pub enum Disposition {
    /// Accept the `start` and launch the pipeline.
    Launch(LaunchRequest),
    /// A session already exists; reject with an error event.
    Reject,
    /// Not a `start`; no pipeline invocation, no reply.
    Ignore,
}

/// The two-state machine behind the loop: idle until the first `start`,
/// then permanently occupied by its session.
#[derive(Default)]
pub struct Dispatcher {
    started: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&mut self, message: ControlMessage) -> Disposition {
        match message {
            ControlMessage::Start { context } if !self.started => {
                self.started = true;
                Disposition::Launch(context)
            }
            ControlMessage::Start { .. } => Disposition::Reject,
            ControlMessage::Ignored => Disposition::Ignore,
        }
    }
}

/// Read control messages from stdin until the parent closes the pipe.
pub async fn run_loop(config: WorkerConfig, channel: Arc<MessageChannel>) -> Result<()> {
    let mut dispatcher = Dispatcher::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut pipeline: Option<JoinHandle<Option<Session>>> = None;
    // The finished session is retained so its page-fault observer stays
    // live until the parent tears the process down.
    let mut retained: Option<Session> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("control channel closed by parent");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let message = match serde_json::from_str::<ControlMessage>(&line) {
                    Ok(message) => message,
                    Err(err) => {
                        warn!(%err, "ignoring malformed control message");
                        continue;
                    }
                };
                match dispatcher.dispose(message) {
                    Disposition::Launch(request) => {
                        info!("start command received");
                        pipeline = Some(tokio::spawn(run_pipeline(
                            request,
                            config.clone(),
                            Arc::clone(&channel),
                        )));
                    }
                    Disposition::Reject => {
                        warn!("start rejected: a session already exists");
                        channel.emit(WorkerEvent::error(
                            "session already running; concurrent start rejected",
                        ));
                    }
                    Disposition::Ignore => {}
                }
            }
            finished = async { pipeline.as_mut().expect("pipeline checked by guard").await },
                if pipeline.is_some() =>
            {
                pipeline = None;
                match finished {
                    Ok(session) => retained = session,
                    Err(err) => error!(%err, "pipeline task failed"),
                }
            }
        }
    }

    drop(retained);
    Ok(())
}

/// Failure boundary around the pipeline: any launch or script failure is
/// reported to the parent as a terminal `error` event; the process itself
/// keeps running.
async fn run_pipeline(
    request: LaunchRequest,
    config: WorkerConfig,
    channel: Arc<MessageChannel>,
) -> Option<Session> {
    match start_session(request, &config, channel.clone()).await {
        Ok(session) => {
            info!("sandboxed script finished");
            Some(session)
        }
        Err(err) => {
            error!(%err, "session pipeline failed");
            channel.emit(WorkerEvent::error(err.to_string()));
            None
        }
    }
}

/// The `start` pipeline: launch the session, then run the script.
///
/// The launcher has already reported `launched` by the time the runner
/// starts, so the parent always learns of a session before sandboxed code
/// can touch it.
async fn start_session(
    request: LaunchRequest,
    config: &WorkerConfig,
    channel: Arc<MessageChannel>,
) -> Result<Session> {
    let sink = channel as Arc<dyn EventSink>;
    let launcher = SessionLauncher::new(config.browser.clone(), sink);
    let session = launcher
        .launch(&request)
        .await
        .map_err(|e| WorkerError::Browser(e.to_string()))?;

    let runner = SandboxRunner::new(config.sandbox.clone());
    let outcome = runner
        .run(session.actions(), &request.code)
        .await
        .map_err(|e| WorkerError::Sandbox(e.to_string()))?;
    debug!(%outcome, "entry point completed");

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_message(code: &str) -> ControlMessage {
        ControlMessage::Start {
            context: LaunchRequest {
                code: code.to_string(),
                flags: Vec::new(),
                use_chrome_stable: false,
            },
        }
    }

    #[test]
    fn test_first_start_launches() {
        let mut dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispose(start_message("async () => {}")),
            Disposition::Launch(_)
        ));
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut dispatcher = Dispatcher::new();
        let _ = dispatcher.dispose(start_message("async () => {}"));
        assert!(matches!(
            dispatcher.dispose(start_message("async () => {}")),
            Disposition::Reject
        ));
    }

    #[test]
    fn test_other_events_are_ignored() {
        let mut dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispose(ControlMessage::Ignored),
            Disposition::Ignore
        ));
        // Ignoring events does not occupy the dispatcher.
        assert!(matches!(
            dispatcher.dispose(start_message("async () => {}")),
            Disposition::Launch(_)
        ));
    }
}
