//! Host ops reachable from inside the isolate.
//!
//! Each op returns a JSON envelope string, `{"ok":...}` or
//! `{"error":"..."}`; the JS shims parse it and rethrow errors inside the
//! sandbox. Keeping the ops infallible at the deno_core layer keeps error
//! shapes under our control.

use crate::bridge::ConsoleBridge;
use crate::error::{Result, SandboxError};
use deno_core::{op2, OpState};
use glovebox_browser::PageActions;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Per-run state the ops reach through `OpState`.
pub(crate) struct SandboxState {
    pub console: ConsoleBridge,
    pub page: Arc<dyn PageActions>,
}

/// Outcome envelope recorded by the script's final `op_sandbox_set_result`.
#[derive(Default)]
pub(crate) struct ScriptOutcome(pub Option<String>);

fn envelope(result: Result<Value>) -> String {
    match result {
        Ok(value) => json!({ "ok": value }).to_string(),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn parse_args(raw: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str(raw)?)
}

fn string_arg<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| SandboxError::Script(format!("page.{method}: argument {index} must be a string")))
}

/// Route one `page.<method>(...)` call to the session's page.
pub(crate) async fn dispatch_page_call(
    page: &Arc<dyn PageActions>,
    method: &str,
    args: &[Value],
) -> Result<Value> {
    match method {
        "goto" => {
            page.goto(string_arg(args, 0, method)?).await?;
            Ok(Value::Null)
        }
        "evaluate" => Ok(page.evaluate(string_arg(args, 0, method)?).await?),
        "content" => Ok(Value::String(page.content().await?)),
        "title" => Ok(page.title().await?.map_or(Value::Null, Value::String)),
        "url" => Ok(page.url().await?.map_or(Value::Null, Value::String)),
        "click" => {
            page.click(string_arg(args, 0, method)?).await?;
            Ok(Value::Null)
        }
        "type" => {
            page.type_text(string_arg(args, 0, method)?, string_arg(args, 1, method)?)
                .await?;
            Ok(Value::Null)
        }
        "waitForNavigation" => {
            page.wait_for_navigation().await?;
            Ok(Value::Null)
        }
        "reload" => {
            page.reload().await?;
            Ok(Value::Null)
        }
        other => Err(SandboxError::UnknownCapability(format!("page.{other}"))),
    }
}

#[op2(async)]
#[string]
pub async fn op_console_call(
    state: Rc<RefCell<OpState>>,
    #[string] method: String,
    #[string] args: String,
) -> String {
    let console = {
        let state = state.borrow();
        state.borrow::<SandboxState>().console.clone()
    };
    let result = match parse_args(&args) {
        Ok(parsed) => console.call(&method, &parsed).await,
        Err(err) => Err(err),
    };
    envelope(result)
}

#[op2(async)]
#[string]
pub async fn op_page_call(
    state: Rc<RefCell<OpState>>,
    #[string] method: String,
    #[string] args: String,
) -> String {
    let page = {
        let state = state.borrow();
        Arc::clone(&state.borrow::<SandboxState>().page)
    };
    let result = match parse_args(&args) {
        Ok(parsed) => dispatch_page_call(&page, &method, &parsed).await,
        Err(err) => Err(err),
    };
    envelope(result)
}

#[op2(fast)]
pub fn op_sandbox_set_result(state: &mut OpState, #[string] payload: &str) {
    state.borrow_mut::<ScriptOutcome>().0 = Some(payload.to_string());
}

deno_core::extension!(
    glovebox_runtime,
    ops = [op_console_call, op_page_call, op_sandbox_set_result],
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        assert_eq!(envelope(Ok(json!(7))), r#"{"ok":7}"#);

        let err = envelope(Err(SandboxError::EmptyCode));
        assert_eq!(err, r#"{"error":"empty script"}"#);
    }

    #[test]
    fn test_string_arg_validation() {
        let args = vec![json!("https://example.com"), json!(5)];
        assert_eq!(
            string_arg(&args, 0, "goto").expect("first arg"),
            "https://example.com"
        );
        assert!(string_arg(&args, 1, "goto").is_err());
        assert!(string_arg(&args, 2, "goto").is_err());
    }
}
