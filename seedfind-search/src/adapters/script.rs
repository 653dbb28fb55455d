//! Script-rendered listing adapter backed by a headless browser.
//!
//! The browser is driven over the W3C WebDriver HTTP protocol (chromedriver,
//! geckodriver, ...). One [`BrowserSession`] is shared by every
//! script-rendered source: the WebDriver session is created on first use,
//! reused across calls, and deleted by [`BrowserSession::shutdown`]. A
//! WebDriver session only drives one page at a time, so all page loads are
//! serialized through an async mutex. Session creation runs on its own
//! task, so a caller cancelled mid-handshake still leaves the new session
//! recorded for reuse and for shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::{BrowserConfig, SearchConfig};
use crate::error::SearchError;
use crate::http;
use crate::source::{ListingRules, SourceDescriptor};
use crate::types::RawRecord;

use super::html::parse_listing;

/// Interval between `document.readyState` polls.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Every WebDriver response wraps its payload in `{"value": ...}`.
#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// Lazily created, process-wide headless browser session.
pub struct BrowserSession {
    config: BrowserConfig,
    user_agent: String,
    client: reqwest::Client,
    /// Active WebDriver session id. The lock is held for a whole page load.
    session: Arc<Mutex<Option<String>>>,
}

impl BrowserSession {
    /// Create a handle. No browser is started until the first [`render`](Self::render).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SearchError::Http(format!("failed to build WebDriver client: {e}")))?;
        Ok(Self {
            config: config.browser.clone(),
            user_agent: http::user_agent_for(config),
            client,
            session: Arc::new(Mutex::new(None)),
        })
    }

    fn base_url(&self) -> Result<&str, SearchError> {
        self.config
            .webdriver_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .ok_or_else(|| SearchError::Browser("no WebDriver endpoint configured".into()))
    }

    /// Whether a WebDriver session is currently open.
    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Load `url`, wait for the DOM to settle and return the rendered markup.
    ///
    /// A session that fails mid-load is discarded so the next call starts
    /// a fresh browser.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Browser`] on any WebDriver failure.
    pub async fn render(&self, url: &str) -> Result<String, SearchError> {
        let base = self.base_url()?.to_owned();
        let mut guard = Arc::clone(&self.session).lock_owned().await;

        if guard.is_none() {
            let client = self.client.clone();
            let user_agent = self.user_agent.clone();
            let endpoint = base.clone();
            let start = tokio::spawn(async move {
                let created = create_session(&client, &endpoint, &user_agent).await;
                if let Ok(id) = &created {
                    *guard = Some(id.clone());
                }
                (guard, created)
            });
            let (returned, created) = start
                .await
                .map_err(|e| SearchError::Browser(format!("session start task failed: {e}")))?;
            guard = returned;
            created?;
            tracing::info!("headless browser session started");
        }

        let Some(session_id) = (*guard).clone() else {
            return Err(SearchError::Browser("no WebDriver session".into()));
        };

        match self.load_page(&base, &session_id, url).await {
            Ok(html) => Ok(html),
            Err(err) => {
                tracing::warn!(error = %err, "browser page load failed, discarding session");
                let _ = self.delete_session(&base, &session_id).await;
                *guard = None;
                Err(err)
            }
        }
    }

    /// Delete the WebDriver session, if one is open.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Browser`] if the WebDriver server rejects the
    /// delete. The handle is reset either way.
    pub async fn shutdown(&self) -> Result<(), SearchError> {
        let mut guard = self.session.lock().await;
        let Some(session_id) = guard.take() else {
            return Ok(());
        };
        let base = self.base_url()?.to_owned();
        self.delete_session(&base, &session_id).await?;
        tracing::info!("headless browser session closed");
        Ok(())
    }

    async fn load_page(
        &self,
        base: &str,
        session_id: &str,
        url: &str,
    ) -> Result<String, SearchError> {
        let session_url = format!("{base}/session/{session_id}");
        command(
            &self.client,
            reqwest::Method::POST,
            &format!("{session_url}/url"),
            Some(json!({ "url": url })),
        )
        .await?;

        self.wait_until_ready(&session_url).await?;
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let source = command(
            &self.client,
            reqwest::Method::GET,
            &format!("{session_url}/source"),
            None,
        )
        .await?;
        source
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| SearchError::Browser("page source was not a string".into()))
    }

    async fn wait_until_ready(&self, session_url: &str) -> Result<(), SearchError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.ready_timeout_seconds);
        let script = json!({ "script": "return document.readyState", "args": [] });
        loop {
            let state = command(
                &self.client,
                reqwest::Method::POST,
                &format!("{session_url}/execute/sync"),
                Some(script.clone()),
            )
            .await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SearchError::Browser("page never reached ready state".into()));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn delete_session(&self, base: &str, session_id: &str) -> Result<(), SearchError> {
        command(
            &self.client,
            reqwest::Method::DELETE,
            &format!("{base}/session/{session_id}"),
            None,
        )
        .await
        .map(|_| ())
    }
}

async fn create_session(
    client: &reqwest::Client,
    base: &str,
    user_agent: &str,
) -> Result<String, SearchError> {
    let capabilities = json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": [
                        "--headless",
                        "--no-sandbox",
                        "--disable-dev-shm-usage",
                        "--disable-gpu",
                        "--window-size=1920,1080",
                        format!("--user-agent={user_agent}"),
                    ]
                }
            }
        }
    });
    let value = command(
        client,
        reqwest::Method::POST,
        &format!("{base}/session"),
        Some(capabilities),
    )
    .await?;
    let session: NewSession = serde_json::from_value(value)
        .map_err(|e| SearchError::Browser(format!("unexpected new-session reply: {e}")))?;
    Ok(session.session_id)
}

/// Send one WebDriver command and unwrap its `value`.
async fn command(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, SearchError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::Browser(format!("WebDriver request failed: {e}")))?;
    let status = response.status();
    let wire: WireResponse = response
        .json()
        .await
        .map_err(|e| SearchError::Browser(format!("invalid WebDriver reply: {e}")))?;
    if !status.is_success() {
        let message = wire
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(SearchError::Browser(format!(
            "WebDriver returned {status}: {message}"
        )));
    }
    Ok(wire.value)
}

/// Adapter for [`SourceStrategy::Script`](crate::source::SourceStrategy::Script) sources.
pub struct ScriptAdapter {
    browser: Arc<BrowserSession>,
    max_rows: usize,
}

impl ScriptAdapter {
    pub fn new(browser: Arc<BrowserSession>, config: &SearchConfig) -> Self {
        Self {
            browser,
            max_rows: config.max_rows_per_source,
        }
    }

    pub fn browser(&self) -> &Arc<BrowserSession> {
        &self.browser
    }

    pub async fn fetch(
        &self,
        query: &str,
        source: &SourceDescriptor,
        rules: &ListingRules,
    ) -> Result<Vec<RawRecord>, SearchError> {
        tracing::trace!(query, source = %source.id, "script-rendered source request");
        let html = self.browser.render(&rules.url_for(query)).await?;
        parse_listing(&html, &rules.selectors, &source.id, self.max_rows)
    }
}
