//! Suite configuration.
//!
//! Everything a run needs is carried in one [`SuiteConfig`]: endpoints,
//! credentials, the target event, the timeout table, and the failure mode.
//! Configs load from a JSON file and default to the constants the suite
//! ships with, so the runner works against a local deployment untouched.

use crate::navigation::{NavigatorConfig, DEFAULT_MAX_SCROLL_ROUNDS, JOIN_BUTTON_TIMEOUT_MS};
use crate::result::{Error, Result};
use crate::wait::{
    WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, PAGE_LOAD_TIMEOUT_MS,
    URL_CHANGE_TIMEOUT_MS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Login credentials for the player under test
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account user name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "user@example.com".to_string(),
            password: "secret".to_string(),
        }
    }
}

/// What a caught interaction error does to the suite verdict.
///
/// Assertion failures always gate, regardless of this setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Record the error, capture evidence, and let the test pass
    #[default]
    ContinueAndLog,
    /// Any interaction error fails the test
    FailFast,
}

/// Configuration for one suite run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Suite name, used for the log file prefix
    pub suite_name: String,
    /// Login page of the deployment under test
    pub base_url: String,
    /// WebDriver endpoint (chromedriver or Selenium)
    pub webdriver_url: String,
    /// Player credentials
    pub credentials: Credentials,
    /// Event to locate and join
    pub event_name: String,
    /// Root directory for logs and run directories
    pub logs_root: PathBuf,
    /// Gate on interaction errors or only on assertions
    pub failure_mode: FailureMode,
    /// Cap on scroll-and-retry rounds in the library search
    pub max_scroll_rounds: usize,
    /// Default element wait timeout in milliseconds
    pub visible_timeout_ms: u64,
    /// Page-load wait timeout in milliseconds
    pub page_load_timeout_ms: u64,
    /// URL-change wait timeout in milliseconds
    pub url_change_timeout_ms: u64,
    /// Join-control wait timeout in milliseconds
    pub join_timeout_ms: u64,
    /// Polling interval for all waits in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            suite_name: "player".to_string(),
            base_url: "http://localhost:8080".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            credentials: Credentials::default(),
            event_name: "Extreme Measures".to_string(),
            logs_root: PathBuf::from("logs"),
            failure_mode: FailureMode::default(),
            max_scroll_rounds: DEFAULT_MAX_SCROLL_ROUNDS,
            visible_timeout_ms: DEFAULT_TIMEOUT_MS,
            page_load_timeout_ms: PAGE_LOAD_TIMEOUT_MS,
            url_change_timeout_ms: URL_CHANGE_TIMEOUT_MS,
            join_timeout_ms: JOIN_BUTTON_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SuiteConfig {
    /// Load a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| Error::Config {
            message: format!("cannot read {}: {err}", path.display()),
        })?;
        serde_json::from_str(&raw).map_err(|err| Error::Config {
            message: format!("invalid config {}: {err}", path.display()),
        })
    }

    /// Default element wait options
    #[must_use]
    pub const fn visible_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.visible_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Page-load wait options
    #[must_use]
    pub const fn page_load_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.page_load_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// URL-change wait options
    #[must_use]
    pub const fn url_change_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.url_change_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Navigation configuration derived from this suite config
    #[must_use]
    pub fn navigator_config(&self) -> NavigatorConfig {
        let mut config = NavigatorConfig::new(self.event_name.clone())
            .with_max_scroll_rounds(self.max_scroll_rounds)
            .with_join(
                WaitOptions::new()
                    .with_timeout(self.join_timeout_ms)
                    .with_poll_interval(self.poll_interval_ms),
            );
        config.clickable = self.visible_options();
        config.lobby = self.visible_options();
        config.control = self.visible_options();
        config.confirm = self.visible_options();
        config
    }
}
