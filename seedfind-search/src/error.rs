//! Error types for the seedfind-search crate.
//!
//! Every variant carries a stable, human-readable message. Errors raised by
//! a single source are captured by the orchestrator and never abort a
//! multi-source retrieval.

/// Errors that can occur while retrieving, parsing or caching results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An HTTP request to a source failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A source did not answer within the per-request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A source response (JSON body or HTML document) could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The headless browser session could not be created or driven.
    #[error("browser error: {0}")]
    Browser(String),

    /// Invalid search configuration or source descriptor.
    #[error("config error: {0}")]
    Config(String),

    /// A result cache read or write failed.
    #[error("cache error: {0}")]
    Cache(String),
}

/// Convenience type alias for seedfind-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
