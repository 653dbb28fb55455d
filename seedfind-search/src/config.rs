//! Retrieval configuration with polite-scraping defaults.
//!
//! [`SearchConfig`] controls the shared concurrency cap, request jitter,
//! timeouts, result limits and the headless browser used for
//! script-rendered sources.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Configuration for multi-source retrieval and ranking.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of in-flight source requests across the whole process.
    pub max_concurrent_requests: usize,
    /// Random delay range in milliseconds `(min, max)` waited before each
    /// source request.
    pub request_delay_ms: (u64, u64),
    /// Per-request timeout in seconds. A source exceeding it contributes nothing.
    pub timeout_seconds: u64,
    /// Maximum number of results returned after ranking.
    pub max_results: usize,
    /// Maximum number of result nodes read from a single listing page.
    pub max_rows_per_source: usize,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Headless browser settings for script-rendered sources.
    pub browser: BrowserConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            request_delay_ms: (2_000, 5_000),
            timeout_seconds: 20,
            max_results: 50,
            max_rows_per_source: 20,
            user_agent: None,
            browser: BrowserConfig::default(),
        }
    }
}

/// WebDriver endpoint and page-load timing for script-rendered sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Base URL of a W3C WebDriver server such as chromedriver,
    /// e.g. `http://127.0.0.1:9515`. `None` disables script-rendered sources.
    pub webdriver_url: Option<String>,
    /// Fixed delay after the DOM reports ready, letting client-side
    /// rendering finish.
    pub settle_delay_ms: u64,
    /// How long to wait for `document.readyState == "complete"`.
    pub ready_timeout_seconds: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            settle_delay_ms: 3_000,
            ready_timeout_seconds: 10,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_concurrent_requests` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `max_results` must be greater than 0
    /// - `request_delay_ms.0` must be <= `request_delay_ms.1`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_concurrent_requests == 0 {
            return Err(SearchError::Config(
                "max_concurrent_requests must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(SearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        Ok(())
    }
}
