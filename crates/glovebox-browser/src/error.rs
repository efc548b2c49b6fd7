use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    Chromium(String),

    #[error("session launch timed out after {secs}s")]
    LaunchTimeout { secs: u64 },

    #[error("invalid debugging endpoint: {0}")]
    Endpoint(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}
