//! seedfind: multi-source torrent search.
//!
//! Wraps the `seedfind-search` retrieval engine with the pieces a
//! long-running front end needs:
//!
//! - **Query expansion** through an OpenAI-compatible chat endpoint, with
//!   a single-query fallback whenever the provider is off or misbehaves
//! - **Result cache** in SQLite keyed by a hash of the normalised query,
//!   with a TTL and a bounded, oldest-first eviction sweep
//! - **Search history** appended for every fresh search
//! - **Background persistence** so cache and history writes never delay a
//!   response
//!
//! [`SearchService`] composes them; the `seedfind` binary is a thin CLI
//! over it.

pub mod ai;
pub mod config;
pub mod error;
pub mod persist;
pub mod service;
pub mod store;
pub mod types;

pub use config::{AiConfig, AppConfig, CacheConfig};
pub use error::{Result, ServiceError};
pub use service::{SearchService, ServiceParts};
pub use store::{HistorySink, SearchHistoryRecord, SqliteStore};
pub use types::{SearchMetadata, SearchMode, SearchRequest, SearchResponse, ServiceStatus, SiteInfo};

pub use seedfind_search::{ResultItem, SourceDescriptor};
