use crate::error::{BrowserError, Result};
use chromiumoxide::Page;
use serde_json::Value;

/// Page operations the sandbox drives a session through.
///
/// The sandboxed script receives a page handle built on this trait; it
/// grants full control of the session's single page on purpose, since
/// driving the session is the point of the script. Tests substitute a
/// recording stub.
#[async_trait::async_trait]
pub trait PageActions: Send + Sync {
    /// Navigate to a URL and wait for the load to settle
    async fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate an expression inside the page and return its value
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Fetch the page's current HTML content
    async fn content(&self) -> Result<String>;

    /// The page's current title, if any
    async fn title(&self) -> Result<Option<String>>;

    /// The page's current URL, if any
    async fn url(&self) -> Result<Option<String>>;

    /// Click an element by selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Type text into an element by selector
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Wait until the next navigation completes
    async fn wait_for_navigation(&self) -> Result<()>;

    /// Reload the page
    async fn reload(&self) -> Result<()>;
}

/// The single page owned by a live session.
pub struct WorkerPage {
    page: Page,
}

impl WorkerPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The page's CDP target identifier.
    pub fn target_id(&self) -> &str {
        self.page.target_id().inner()
    }
}

#[async_trait::async_trait]
impl PageActions for WorkerPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url.to_string())
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(expression.to_string())
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))
    }

    async fn title(&self) -> Result<Option<String>> {
        self.page
            .get_title()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))
    }

    async fn url(&self) -> Result<Option<String>> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector.to_string())
            .await
            .map_err(|e| BrowserError::SelectorNotFound(format!("{selector}: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector.to_string())
            .await
            .map_err(|e| BrowserError::SelectorNotFound(format!("{selector}: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.page
            .reload()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }
}
