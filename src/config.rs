use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::Browser;
use crate::error::{Error, Result};

/// Environment variable holding the completion-endpoint API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Read the API key from the given environment variable.
/// A missing or empty value is a startup error; nothing else may run first.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::StartupError(format!(
            "API key not found. Set the {var} environment variable."
        ))),
    }
}

#[derive(Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Default timeout for operations like `wait_for_selector` (default: 30s).
    pub default_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chrome_path: None,
            default_timeout: Duration::from_secs(30),
        }
    }
}

pub struct BrowserBuilder {
    config: BrowserConfig,
}

impl BrowserBuilder {
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Set the default timeout for operations like `wait_for_selector`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build_config(self) -> BrowserConfig {
        self.config
    }

    pub async fn build(self) -> Result<Browser> {
        Browser::launch(self.build_config()).await
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one run needs: where to go, what data to draw from, which
/// model resolves the values, and where the artifacts land.
#[derive(Clone)]
pub struct RunConfig {
    /// URL of the form to fill.
    pub target_url: String,
    /// Path to the JSON file holding the mock data record.
    pub data_file: PathBuf,
    /// Model identifier sent to the completion endpoint.
    pub model: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Directory receiving the video and screenshot artifacts.
    pub output_dir: PathBuf,
    /// Whether to trigger the form's submit action after filling.
    pub submit: bool,
    pub browser: BrowserConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_a_startup_error() {
        let err = api_key_from_env("FORMPILOT_TEST_KEY_UNSET").unwrap_err();
        assert!(matches!(err, Error::StartupError(_)));
    }

    #[test]
    fn empty_api_key_is_a_startup_error() {
        env::set_var("FORMPILOT_TEST_KEY_EMPTY", "  ");
        let err = api_key_from_env("FORMPILOT_TEST_KEY_EMPTY").unwrap_err();
        assert!(matches!(err, Error::StartupError(_)));
    }

    #[test]
    fn present_api_key_is_returned() {
        env::set_var("FORMPILOT_TEST_KEY_SET", "sk-test");
        assert_eq!(api_key_from_env("FORMPILOT_TEST_KEY_SET").unwrap(), "sk-test");
    }
}
