use glovebox_browser::BrowserError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("capability not in the allowlist: {0}")]
    UnknownCapability(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("script execution timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("script too large: {size} bytes (max {max})")]
    CodeTooLarge { size: usize, max: usize },

    #[error("empty script")]
    EmptyCode,

    #[error("isolate error: {0}")]
    Isolate(String),

    #[error("page error: {0}")]
    Page(#[from] BrowserError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SandboxError::UnknownCapability("spawn".to_string());
        assert_eq!(err.to_string(), "capability not in the allowlist: spawn");

        let err = SandboxError::Timeout { secs: 300 };
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_error_from_browser() {
        let err: SandboxError = BrowserError::Evaluation("detached".to_string()).into();
        assert!(matches!(err, SandboxError::Page(_)));
    }
}
