//! Request and response shapes of the search service.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use seedfind_search::{ResultItem, SourceDescriptor};

/// How a request treats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Cache first, then live retrieval.
    #[default]
    Scraping,
    /// Same pipeline as `Scraping`; kept as a distinct client label.
    AiOrganize,
    /// Bypass the cache lookup and always retrieve.
    Memory,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scraping => "scraping",
            Self::AiOrganize => "ai-organize",
            Self::Memory => "memory",
        }
    }

    /// Whether the cache is consulted before retrieval.
    pub fn reads_cache(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_max_sites() -> usize {
    5
}

fn default_use_ai() -> bool {
    true
}

/// One search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Required; rejected when empty after trimming.
    pub query: String,
    #[serde(default)]
    pub mode: SearchMode,
    /// Only the first `max_sites` active sources are queried.
    #[serde(default = "default_max_sites")]
    pub max_sites: usize,
    /// Enables query expansion and scored ranking when AI is available.
    #[serde(default = "default_use_ai")]
    pub use_ai: bool,
}

impl SearchRequest {
    /// A request with default mode, site cap and AI flag.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: SearchMode::default(),
            max_sites: default_max_sites(),
            use_ai: default_use_ai(),
        }
    }
}

/// Per-response bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub cached: bool,
    pub total_results: usize,
    pub processing_time_seconds: f64,
    /// Distinct sources among the returned results.
    pub sources_used: usize,
    pub ai_processed: bool,
    /// Number of query variants retrieved. Absent on cache hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries_used: Option<usize>,
}

/// The answer to a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<ResultItem>,
    pub metadata: SearchMetadata,
    /// The trimmed query.
    pub query: String,
    pub processing_time_seconds: f64,
}

impl SearchResponse {
    pub(crate) fn new(
        query: &str,
        results: Vec<ResultItem>,
        cached: bool,
        ai_processed: bool,
        queries_used: Option<usize>,
        processing_time_seconds: f64,
    ) -> Self {
        let metadata = SearchMetadata {
            cached,
            total_results: results.len(),
            processing_time_seconds,
            sources_used: distinct_sources(&results),
            ai_processed,
            queries_used,
        };
        Self {
            results,
            metadata,
            query: query.to_owned(),
            processing_time_seconds,
        }
    }
}

fn distinct_sources(results: &[ResultItem]) -> usize {
    results
        .iter()
        .map(|r| r.source_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// One row of the sites listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub active: bool,
    pub reliability: f64,
    /// `"API"`, `"HTML"` or `"JS"`.
    pub kind: String,
}

impl From<&SourceDescriptor> for SiteInfo {
    fn from(source: &SourceDescriptor) -> Self {
        Self {
            name: source.name.clone(),
            active: source.active,
            reliability: source.reliability,
            kind: source.kind_label().to_owned(),
        }
    }
}

/// Service liveness summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub version: String,
    pub ai_enabled: bool,
    /// Active sources in the catalog.
    pub sites_available: usize,
}
