//! Persistent cache and search history.
//!
//! [`SqliteStore`] implements both the engine's
//! [`ResultCache`](seedfind_search::ResultCache) contract and
//! [`HistorySink`]. History is write-only from the service's point of view.

mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One append-only audit row for a fresh (non-cached) search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryRecord {
    pub query: String,
    pub results_count: usize,
    pub processing_time_seconds: f64,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

/// Destination for history rows.
pub trait HistorySink: Send + Sync {
    /// Append one row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`](crate::error::ServiceError::Store) on write failure.
    fn record(&self, entry: &SearchHistoryRecord) -> Result<()>;
}
