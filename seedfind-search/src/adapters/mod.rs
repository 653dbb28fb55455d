//! Source adapter implementations.
//!
//! Each module handles one retrieval kind. [`Adapters`] bundles all three
//! and implements [`SourceAdapter`] by dispatching on the descriptor's
//! [`SourceStrategy`] tag.

pub mod api;
pub mod html;
pub mod script;

use std::sync::Arc;

pub use api::ApiAdapter;
pub use html::{first_number, parse_listing, HtmlAdapter};
pub use script::{BrowserSession, ScriptAdapter};

use crate::adapter::SourceAdapter;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::source::{SourceDescriptor, SourceStrategy};
use crate::types::RawRecord;

/// The production adapter set: API, static-HTML and script-rendered.
pub struct Adapters {
    api: ApiAdapter,
    html: HtmlAdapter,
    script: ScriptAdapter,
}

impl Adapters {
    /// Build all adapters from one configuration. The browser session is
    /// created lazily on the first script-rendered request.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the browser's HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let browser = Arc::new(BrowserSession::new(config)?);
        Ok(Self {
            api: ApiAdapter::new(config.clone()),
            html: HtmlAdapter::new(config.clone()),
            script: ScriptAdapter::new(browser, config),
        })
    }

    /// The shared headless browser handle.
    pub fn browser(&self) -> &Arc<BrowserSession> {
        self.script.browser()
    }

    /// Tear down the browser session, if one was started.
    pub async fn shutdown(&self) {
        if let Err(err) = self.script.browser().shutdown().await {
            tracing::warn!(error = %err, "browser shutdown failed");
        }
    }
}

impl SourceAdapter for Adapters {
    async fn fetch(
        &self,
        query: &str,
        source: &SourceDescriptor,
    ) -> Result<Vec<RawRecord>, SearchError> {
        match &source.retrieval {
            SourceStrategy::Api(rules) => self.api.fetch(query, source, rules).await,
            SourceStrategy::Html(rules) => self.html.fetch(query, source, rules).await,
            SourceStrategy::Script(rules) => self.script.fetch(query, source, rules).await,
        }
    }
}
