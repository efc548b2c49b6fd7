//! Sandbox runner: drives caller-supplied script text to completion.
//!
//! V8 isolates are `!Send`, so each run gets a dedicated thread with its
//! own single-threaded tokio runtime; the public API is async and
//! `Send`-safe. A fresh isolate is built per run and discarded afterwards.

use crate::bridge::{SandboxGlobals, CONSOLE_METHODS};
use crate::error::{Result, SandboxError};
use crate::ops::{glovebox_runtime, SandboxState, ScriptOutcome};
use deno_core::{v8, JsRuntime, PollEventLoopOptions, RuntimeOptions};
use glovebox_browser::PageActions;
use glovebox_core::config::SandboxSettings;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Runs sandboxed scripts against a live session.
pub struct SandboxRunner {
    settings: SandboxSettings,
}

impl SandboxRunner {
    #[must_use]
    pub fn new(settings: SandboxSettings) -> Self {
        Self { settings }
    }

    /// Execute `code` with the given page handle.
    ///
    /// The script text must evaluate to an async callable; it is invoked
    /// with `{ page, context: {} }` and awaited. The only ambient global it
    /// sees is the proxied `console`. Returns the entry point's (JSON)
    /// return value, or the script failure.
    pub async fn run(&self, page: Arc<dyn PageActions>, code: &str) -> Result<Value> {
        validate_code(code, self.settings.max_code_bytes)?;
        debug!(code_len = code.len(), "starting sandboxed script");

        let settings = self.settings.clone();
        let code = code.to_string();
        let (tx, rx) = tokio::sync::oneshot::channel();

        // V8 isolates are !Send - run everything on a dedicated thread.
        std::thread::Builder::new()
            .name("glovebox-sandbox".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build();
                let outcome = match runtime {
                    Ok(rt) => rt.block_on(run_script(&settings, page, &code)),
                    Err(err) => Err(SandboxError::Isolate(err.to_string())),
                };
                if tx.send(outcome).is_err() {
                    tracing::warn!("sandbox result receiver dropped");
                }
            })
            .map_err(|e| SandboxError::Isolate(e.to_string()))?;

        rx.await
            .map_err(|_| SandboxError::Isolate("sandbox thread panicked".to_string()))?
    }
}

fn validate_code(code: &str, max_bytes: usize) -> Result<()> {
    if code.trim().is_empty() {
        return Err(SandboxError::EmptyCode);
    }
    if code.len() > max_bytes {
        return Err(SandboxError::CodeTooLarge {
            size: code.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

async fn run_script(
    settings: &SandboxSettings,
    page: Arc<dyn PageActions>,
    code: &str,
) -> Result<Value> {
    let create_params = v8::CreateParams::default().heap_limits(0, settings.max_heap_bytes);
    let mut runtime = JsRuntime::new(RuntimeOptions {
        extensions: vec![glovebox_runtime::init_ops()],
        create_params: Some(create_params),
        ..Default::default()
    });

    let globals = SandboxGlobals::for_page(Arc::clone(&page));
    {
        let state = runtime.op_state();
        let mut state = state.borrow_mut();
        state.put(SandboxState {
            console: globals.console,
            page,
        });
        state.put(ScriptOutcome::default());
    }

    let script = render_script(code);
    runtime
        .execute_script("[glovebox:run]", script)
        .map_err(|e| SandboxError::Script(e.to_string()))?;

    let deadline = Duration::from_secs(settings.timeout_secs);
    match tokio::time::timeout(
        deadline,
        runtime.run_event_loop(PollEventLoopOptions::default()),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(SandboxError::Script(err.to_string())),
        Err(_) => {
            return Err(SandboxError::Timeout {
                secs: settings.timeout_secs,
            })
        }
    }

    let outcome = {
        let state = runtime.op_state();
        let state = state.borrow();
        state.borrow::<ScriptOutcome>().0.clone()
    }
    .ok_or_else(|| SandboxError::Script("script produced no outcome".to_string()))?;

    let outcome: Value = serde_json::from_str(&outcome)?;
    if let Some(error) = outcome.get("error") {
        return Err(SandboxError::Script(
            error.as_str().unwrap_or("unknown script error").to_string(),
        ));
    }
    Ok(outcome.get("ok").cloned().unwrap_or(Value::Null))
}

/// The single script evaluated in the isolate.
///
/// Captures the ops in a closure, installs the frozen `console` global
/// from the capability list, builds the page proxy passed to the entry
/// point, strips the host-facing globals, then evaluates the caller's
/// code. The caller's text must evaluate to a callable.
fn render_script(code: &str) -> String {
    let methods_json =
        serde_json::to_string(CONSOLE_METHODS).expect("console method list serializes");
    format!(
        r#"
((ops) => {{
    const hostCall = async (op, method, args) => {{
        const out = JSON.parse(await op(method, JSON.stringify(args)));
        if (out.error !== undefined) {{
            throw new Error(out.error);
        }}
        return out.ok;
    }};
    const consoleCall = (method, args) => hostCall(ops.op_console_call, method, args);
    const pageCall = (method, args) => hostCall(ops.op_page_call, method, args);
    const setOutcome = (payload) => ops.op_sandbox_set_result(payload);

    const browserConsole = {{}};
    for (const method of {methods_json}) {{
        browserConsole[method] = (...args) => consoleCall(method, args);
    }}
    globalThis.console = Object.freeze(browserConsole);

    const page = Object.freeze({{
        goto: (url) => pageCall("goto", [url]),
        evaluate: (expression) => pageCall("evaluate", [String(expression)]),
        content: () => pageCall("content", []),
        title: () => pageCall("title", []),
        url: () => pageCall("url", []),
        click: (selector) => pageCall("click", [selector]),
        type: (selector, text) => pageCall("type", [selector, text]),
        waitForNavigation: () => pageCall("waitForNavigation", []),
        reload: () => pageCall("reload", []),
    }});

    delete globalThis.Deno;
    delete globalThis.eval;

    return (async () => {{
        try {{
            const entry = ({code});
            if (typeof entry !== "function") {{
                throw new TypeError("script must evaluate to a callable entry point");
            }}
            const value = await entry({{ page, context: {{}} }});
            setOutcome(JSON.stringify({{ ok: value === undefined ? null : value }}));
        }} catch (err) {{
            setOutcome(JSON.stringify({{ error: (err && err.message) || String(err) }}));
        }}
    }})();
}})(Deno.core.ops);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code_rejects_empty() {
        assert!(matches!(
            validate_code("   \n", 1024),
            Err(SandboxError::EmptyCode)
        ));
    }

    #[test]
    fn test_validate_code_rejects_oversized() {
        let code = "x".repeat(2048);
        assert!(matches!(
            validate_code(&code, 1024),
            Err(SandboxError::CodeTooLarge { .. })
        ));
        assert!(validate_code(&code, 4096).is_ok());
    }

    #[test]
    fn test_render_script_embeds_code_and_methods() {
        let script = render_script("async () => {}");
        assert!(script.contains("const entry = (async () => {});"));
        assert!(script.contains(r#""log""#));
        assert!(script.contains("delete globalThis.Deno;"));
    }
}
