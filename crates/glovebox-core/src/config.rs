//! Configuration management for the Glovebox worker.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main worker configuration.
///
/// This is loaded from `~/.config/glovebox/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Browser session settings
    pub browser: BrowserSettings,
    /// Sandbox execution settings
    pub sandbox: SandboxSettings,
}

impl WorkerConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `GLOVEBOX_HEADLESS`: Override browser headless mode (true/false)
    /// - `GLOVEBOX_CHROME_STABLE_PATH`: Override the stable Chrome executable path
    /// - `GLOVEBOX_SANDBOX_TIMEOUT_SECS`: Override the sandbox execution timeout
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        // Override from environment
        if let Ok(val) = std::env::var("GLOVEBOX_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("GLOVEBOX_CHROME_STABLE_PATH") {
            if !val.is_empty() {
                tracing::debug!("Override browser.stable_executable from env: {}", val);
                config.browser.stable_executable = val;
            }
        }

        if let Ok(val) = std::env::var("GLOVEBOX_SANDBOX_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.sandbox.timeout_secs = secs;
                tracing::debug!("Override sandbox.timeout_secs from env: {}", secs);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/glovebox/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("dev", "glovebox", "glovebox").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run the browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Session launch timeout in seconds
    pub launch_timeout_secs: u64,
    /// Fixed executable path used when a launch requests stable Chrome
    pub stable_executable: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            launch_timeout_secs: 30,
            stable_executable: "/usr/bin/google-chrome".to_string(),
        }
    }
}

/// Sandbox execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    /// Maximum script execution time in seconds
    pub timeout_secs: u64,
    /// Maximum size of caller-supplied script text in bytes
    pub max_code_bytes: usize,
    /// V8 heap limit in bytes
    pub max_heap_bytes: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            max_code_bytes: 64 * 1024,        // 64 KB
            max_heap_bytes: 128 * 1024 * 1024, // 128 MB
        }
    }
}
