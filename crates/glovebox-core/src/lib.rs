//! Glovebox Core - Foundation crate for the Glovebox browser worker.
//!
//! This crate provides the shared error types, configuration management and
//! wire protocol that all other Glovebox crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`protocol`] - Message envelopes exchanged with the parent process
//!
//! # Example
//!
//! ```rust
//! use glovebox_core::{ControlMessage, WorkerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkerConfig::default();
//! assert!(config.browser.headless);
//!
//! let message: ControlMessage =
//!     serde_json::from_str(r#"{"event":"ping"}"#)?;
//! assert!(matches!(message, ControlMessage::Ignored));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod protocol;

// Re-export commonly used types
pub use config::{BrowserSettings, SandboxSettings, WorkerConfig};
pub use error::{ConfigError, ConfigResult, Result, WorkerError};
pub use protocol::{
    ControlMessage, ErrorContext, ErrorDetail, EventSink, LaunchRequest, LaunchedInfo, WorkerEvent,
};
