//! Capability bridge: the proxied console injected into the sandbox.
//!
//! Every proxy forwards its method name and arguments into the page's own
//! console via remote evaluation. The method set is an explicit, versioned
//! allowlist rather than reflection over the host console, so the exposed
//! surface is auditable and fixed at compile time.

use crate::error::{Result, SandboxError};
use glovebox_browser::PageActions;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// The console surface proxied into the sandbox.
///
/// Version 1: the standard console methods. Growing this list is a
/// reviewed change, not a runtime discovery.
pub const CONSOLE_METHODS: &[&str] = &[
    "assert",
    "clear",
    "count",
    "countReset",
    "debug",
    "dir",
    "dirxml",
    "error",
    "group",
    "groupCollapsed",
    "groupEnd",
    "info",
    "log",
    "table",
    "time",
    "timeEnd",
    "timeLog",
    "trace",
    "warn",
];

/// The remote-evaluation expression that replays a console call inside the
/// page. Method name and arguments are embedded as JSON literals, so the
/// call is relayed verbatim; arguments must be JSON-transferable.
pub fn forward_expression(method: &str, args: &[Value]) -> Result<String> {
    let method_json = serde_json::to_string(method)?;
    let args_json = serde_json::to_string(args)?;
    Ok(format!(
        "((m, a) => console[m](...a))({method_json}, {args_json})"
    ))
}

/// Proxies allowlisted console calls into a session's page.
///
/// The bridge only borrows the page handle; it has no lifetime of its own
/// beyond the session it was built for.
#[derive(Clone)]
pub struct ConsoleBridge {
    page: Arc<dyn PageActions>,
    methods: &'static [&'static str],
}

impl ConsoleBridge {
    pub fn new(page: Arc<dyn PageActions>) -> Self {
        Self {
            page,
            methods: CONSOLE_METHODS,
        }
    }

    /// The exact method set this bridge proxies.
    #[must_use]
    pub fn method_names(&self) -> &'static [&'static str] {
        self.methods
    }

    /// Replay `console.<method>(...args)` inside the page and return the
    /// evaluation result. Methods outside the allowlist are rejected.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        if !self.methods.contains(&method) {
            return Err(SandboxError::UnknownCapability(format!("console.{method}")));
        }
        debug!(method, args = args.len(), "forwarding console call to page");
        let expression = forward_expression(method, args)?;
        Ok(self.page.evaluate(&expression).await?)
    }
}

/// The restricted object graph injected into the sandbox: a console, and
/// nothing else.
pub struct SandboxGlobals {
    pub console: ConsoleBridge,
}

impl SandboxGlobals {
    /// Build the globals for one live session.
    #[must_use]
    pub fn for_page(page: Arc<dyn PageActions>) -> Self {
        Self {
            console: ConsoleBridge::new(page),
        }
    }
}
