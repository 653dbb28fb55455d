//! Trait definition for pluggable source adapters.
//!
//! An adapter turns a query plus a [`SourceDescriptor`] into raw records.
//! The production dispatcher is [`Adapters`](crate::adapters::Adapters),
//! which selects the API, static-HTML or script-rendered strategy from the
//! descriptor's tag.

use crate::error::SearchError;
use crate::source::SourceDescriptor;
use crate::types::RawRecord;

/// Retrieval and parse strategy for external sources.
///
/// Implementors handle their own:
///
/// - URL construction with query encoding
/// - HTTP request with appropriate headers
/// - Response parsing (JSON body or HTML nodes)
///
/// Malformed individual records are skipped inside the adapter. Returning an
/// error means the whole source failed; the orchestrator then counts it as
/// an empty contribution.
///
/// All implementations must be `Send + Sync` for concurrent source queries.
pub trait SourceAdapter: Send + Sync {
    /// Fetch and parse raw records for `query` from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the request fails, times out or the
    /// response cannot be parsed at all.
    fn fetch(
        &self,
        query: &str,
        source: &SourceDescriptor,
    ) -> impl std::future::Future<Output = Result<Vec<RawRecord>, SearchError>> + Send;
}
