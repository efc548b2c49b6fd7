use glovebox_browser::error::Result as BrowserResult;
use glovebox_browser::PageActions;
use glovebox_core::config::SandboxSettings;
use glovebox_sandbox::bridge::forward_expression;
use glovebox_sandbox::{SandboxError, SandboxRunner};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Records every operation the sandbox drives the page through.
#[derive(Default)]
struct StubPage {
    evaluations: Mutex<Vec<String>>,
    navigations: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl PageActions for StubPage {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        self.navigations
            .lock()
            .expect("stub lock")
            .push(url.to_string());
        Ok(())
    }
    async fn evaluate(&self, expression: &str) -> BrowserResult<Value> {
        self.evaluations
            .lock()
            .expect("stub lock")
            .push(expression.to_string());
        Ok(Value::Null)
    }
    async fn content(&self) -> BrowserResult<String> {
        Ok("<html></html>".to_string())
    }
    async fn title(&self) -> BrowserResult<Option<String>> {
        Ok(Some("stub".to_string()))
    }
    async fn url(&self) -> BrowserResult<Option<String>> {
        Ok(Some("about:blank".to_string()))
    }
    async fn click(&self, _selector: &str) -> BrowserResult<()> {
        Ok(())
    }
    async fn type_text(&self, _selector: &str, _text: &str) -> BrowserResult<()> {
        Ok(())
    }
    async fn wait_for_navigation(&self) -> BrowserResult<()> {
        Ok(())
    }
    async fn reload(&self) -> BrowserResult<()> {
        Ok(())
    }
}

fn runner() -> SandboxRunner {
    SandboxRunner::new(SandboxSettings {
        timeout_secs: 10,
        ..SandboxSettings::default()
    })
}

#[tokio::test]
async fn test_entry_point_runs_with_page_and_context() {
    let page = Arc::new(StubPage::default());

    let value = runner()
        .run(
            page.clone(),
            r#"async ({ page, context }) => {
                await page.goto("https://example.com");
                return Object.keys(context).length;
            }"#,
        )
        .await
        .expect("run script");

    assert_eq!(value, json!(0));
    assert_eq!(
        *page.navigations.lock().expect("stub lock"),
        vec!["https://example.com".to_string()]
    );
}

#[tokio::test]
async fn test_console_calls_reach_the_page_not_the_host() {
    let page = Arc::new(StubPage::default());

    runner()
        .run(
            page.clone(),
            r#"async () => { await console.warn("low disk", 42); }"#,
        )
        .await
        .expect("run script");

    let evaluations = page.evaluations.lock().expect("stub lock");
    assert_eq!(evaluations.len(), 1);
    assert_eq!(
        evaluations[0],
        forward_expression("warn", &[json!("low disk"), json!(42)]).expect("expression")
    );
}

#[tokio::test]
async fn test_page_title_round_trips() {
    let page = Arc::new(StubPage::default());

    let value = runner()
        .run(page, r#"async ({ page }) => page.title()"#)
        .await
        .expect("run script");

    assert_eq!(value, json!("stub"));
}

#[tokio::test]
async fn test_non_callable_code_is_rejected() {
    let err = runner()
        .run(Arc::new(StubPage::default()), "42")
        .await
        .unwrap_err();

    match err {
        SandboxError::Script(message) => {
            assert!(message.contains("callable entry point"), "got: {message}");
        }
        other => panic!("expected script error, got {other}"),
    }
}

#[tokio::test]
async fn test_entry_point_failures_propagate() {
    let err = runner()
        .run(
            Arc::new(StubPage::default()),
            r#"async () => { throw new Error("boom"); }"#,
        )
        .await
        .unwrap_err();

    match err {
        SandboxError::Script(message) => assert!(message.contains("boom")),
        other => panic!("expected script error, got {other}"),
    }
}

#[tokio::test]
async fn test_host_globals_are_stripped() {
    let value = runner()
        .run(
            Arc::new(StubPage::default()),
            r#"async () => [typeof Deno, typeof eval]"#,
        )
        .await
        .expect("run script");

    assert_eq!(value, json!(["undefined", "undefined"]));
}

#[tokio::test]
async fn test_empty_code_is_rejected() {
    let err = runner()
        .run(Arc::new(StubPage::default()), "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::EmptyCode));
}
