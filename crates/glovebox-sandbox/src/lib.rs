//! Sandboxed script execution for the Glovebox worker.
//!
//! Caller-supplied script text runs in a fresh V8 isolate whose only
//! injected global is a proxied `console`. The proxy relays every call into
//! the browser page's own console via remote evaluation - the worker
//! process never prints delegated output. The script's entry point is
//! invoked with a page handle that grants full session control; the
//! isolation boundary is the injected-globals allowlist, not the page
//! handle.
//!
//! ## Isolation model
//!
//! - **Fresh isolate per run**: no state leaks between executions
//! - **No ambient capabilities**: no fs, net, env or process access
//! - **Explicit capability list**: the console surface is enumerated
//!   configuration, not runtime reflection
//! - **Heap and time limits**: V8 heap capped, event loop driven under a
//!   deadline

pub mod bridge;
pub mod error;
mod ops;
pub mod runner;

pub use bridge::{ConsoleBridge, SandboxGlobals, CONSOLE_METHODS};
pub use error::{Result, SandboxError};
pub use runner::SandboxRunner;
