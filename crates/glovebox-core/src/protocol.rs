//! Wire protocol between the worker and its parent process.
//!
//! Messages are JSON envelopes with a required `event` discriminant and an
//! event-specific `context` payload, exchanged as newline-delimited JSON
//! over the process channel. The envelopes are immutable once sent; there
//! is no acknowledgment and no delivery guarantee beyond the channel's own
//! FIFO ordering.

use serde::{Deserialize, Serialize};

/// Control message received from the parent process.
///
/// Only `start` triggers any behavior; every other `event` value
/// deserializes to [`ControlMessage::Ignored`] and is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Launch a browser session and run the supplied script against it.
    Start {
        /// The launch parameters.
        context: LaunchRequest,
    },
    /// Any event this worker does not handle.
    #[serde(other)]
    Ignored,
}

/// Lifecycle event sent to the parent process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// A browser session is up and reachable for remote inspection.
    Launched {
        /// Where the parent can attach.
        context: LaunchedInfo,
    },
    /// A fault occurred, either inside the page or in the pipeline.
    Error {
        /// The fault description.
        context: ErrorContext,
    },
}

impl WorkerEvent {
    /// Build a `launched` event for a live session.
    #[must_use]
    pub fn launched(info: LaunchedInfo) -> Self {
        Self::Launched { context: info }
    }

    /// Build an `error` event carrying the given message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            context: ErrorContext {
                error: ErrorDetail {
                    message: message.into(),
                },
                event: "error".to_string(),
            },
        }
    }
}

/// Parameters of a `start` command.
///
/// `code` is untrusted source text that must evaluate to an async entry
/// function; `flags` are passed verbatim to the session launcher on top of
/// the mandatory hardening flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Caller-supplied script text.
    pub code: String,
    /// Additional browser flags, passed through verbatim.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Select the fixed stable Chrome binary instead of the bundled one.
    #[serde(default)]
    pub use_chrome_stable: bool,
}

/// The minimal descriptor the parent needs to locate a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchedInfo {
    /// Remote-debugging port the browser is listening on.
    pub port: u16,
    /// Devtools path of the session's page (`/devtools/page/<targetId>`).
    pub url: String,
}

/// Context payload of an `error` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// The fault itself.
    pub error: ErrorDetail,
    /// Discriminant repeated for consumers that only read the context.
    pub event: String,
}

/// A serializable fault description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable fault message.
    pub message: String,
}

/// Outbound side of the message channel, as seen by event producers.
///
/// The launcher and its page-fault observer emit through this trait so they
/// stay independent of the concrete transport. Emission is fire-and-forget:
/// implementations must not panic on delivery failure.
pub trait EventSink: Send + Sync {
    /// Deliver one event to the parent.
    fn emit(&self, event: WorkerEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_message_parses() {
        let message: ControlMessage = serde_json::from_str(
            r#"{"event":"start","context":{"code":"async () => {}","flags":["--x"],"useChromeStable":true}}"#,
        )
        .expect("parse start message");

        match message {
            ControlMessage::Start { context } => {
                assert_eq!(context.code, "async () => {}");
                assert_eq!(context.flags, vec!["--x".to_string()]);
                assert!(context.use_chrome_stable);
            }
            ControlMessage::Ignored => panic!("expected start"),
        }
    }

    #[test]
    fn test_launch_request_defaults() {
        let message: ControlMessage =
            serde_json::from_str(r#"{"event":"start","context":{"code":"async () => {}"}}"#)
                .expect("parse minimal start message");

        match message {
            ControlMessage::Start { context } => {
                assert!(context.flags.is_empty());
                assert!(!context.use_chrome_stable);
            }
            ControlMessage::Ignored => panic!("expected start"),
        }
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        for raw in [
            r#"{"event":"noop"}"#,
            r#"{"event":"ping","context":{"x":1}}"#,
            r#"{"event":"launched"}"#,
        ] {
            let message: ControlMessage = serde_json::from_str(raw).expect("parse unknown event");
            assert!(matches!(message, ControlMessage::Ignored), "raw: {raw}");
        }
    }

    #[test]
    fn test_launched_event_wire_shape() {
        let event = WorkerEvent::launched(LaunchedInfo {
            port: 9222,
            url: "/devtools/page/ABC123".to_string(),
        });

        let json = serde_json::to_value(&event).expect("serialize launched event");
        assert_eq!(json["event"], "launched");
        assert_eq!(json["context"]["port"], 9222);
        assert_eq!(json["context"]["url"], "/devtools/page/ABC123");
    }

    #[test]
    fn test_error_event_wire_shape() {
        let event = WorkerEvent::error("page crashed");

        let json = serde_json::to_value(&event).expect("serialize error event");
        assert_eq!(json["event"], "error");
        assert_eq!(json["context"]["event"], "error");
        assert_eq!(json["context"]["error"]["message"], "page crashed");
    }
}
