//! Error types for the seedfind service.

use seedfind_search::SearchError;

/// Top-level error type for the search service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request was rejected before any work began (e.g. empty query).
    #[error("invalid request: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Cache or history database error.
    #[error("store error: {0}")]
    Store(String),

    /// Generative-text provider error.
    #[error("AI error: {0}")]
    Ai(String),

    /// Retrieval engine error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;
