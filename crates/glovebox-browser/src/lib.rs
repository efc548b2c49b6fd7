//! Browser session launcher for the Glovebox worker.
//!
//! Boots isolated Chromium sessions with a hardened flag set, opens a
//! single page, observes page faults, and derives the remote-debugging
//! address the parent process attaches to.

pub mod actions;
pub mod error;
pub mod launcher;

pub use actions::{PageActions, WorkerPage};
pub use error::{BrowserError, Result};
pub use launcher::{Session, SessionLauncher};
