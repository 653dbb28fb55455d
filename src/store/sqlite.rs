//! SQLite-backed result cache and search history.
//!
//! Thread-safe via an internal `Mutex<Connection>`. Every call is a short
//! synchronous transaction; async callers run them on the blocking pool.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use seedfind_search::cache::{CacheEntry, ResultCache, query_hash};
use seedfind_search::types::now_epoch_secs;
use seedfind_search::{ResultItem, SearchError};

use super::schema::apply_schema;
use super::{HistorySink, SearchHistoryRecord};
use crate::error::{Result, ServiceError};

/// Cache and history tables in one SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    ttl_seconds: u64,
    max_entries: usize,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path, ttl_seconds: u64, max_entries: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, ttl_seconds, max_entries)
    }

    /// A private in-memory database, for tests and `--no-cache` style runs.
    pub fn open_in_memory(ttl_seconds: u64, max_entries: usize) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, ttl_seconds, max_entries)
    }

    fn with_connection(conn: Connection, ttl_seconds: u64, max_entries: usize) -> Result<Self> {
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl_seconds,
            max_entries,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ServiceError::Store(format!("lock poisoned: {e}")))
    }

    /// The live entry for `query` at clock reading `now`, if any.
    pub fn entry_at(&self, query: &str, now: u64) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT query, results, created_at, expires_at FROM search_cache \
                 WHERE query_hash = ?1 AND expires_at > ?2",
                params![query_hash(query), now as i64],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((query, results, created_at, expires_at)) = row else {
            return Ok(None);
        };
        let items: Vec<ResultItem> = serde_json::from_str(&results)
            .map_err(|e| ServiceError::Store(format!("corrupt cached results: {e}")))?;
        Ok(Some(CacheEntry {
            query,
            items,
            created_at: created_at.max(0) as u64,
            expires_at: expires_at.max(0) as u64,
        }))
    }

    /// Cached items for `query` at clock reading `now`.
    pub fn lookup_at(&self, query: &str, now: u64) -> Result<Option<Vec<ResultItem>>> {
        Ok(self.entry_at(query, now)?.map(|e| e.items))
    }

    /// Upsert `items` for `query` at `now`, then sweep expired and excess rows.
    pub fn store_at(&self, query: &str, items: &[ResultItem], now: u64) -> Result<()> {
        let results = serde_json::to_string(items)
            .map_err(|e| ServiceError::Store(format!("cannot serialise results: {e}")))?;
        let expires_at = now.saturating_add(self.ttl_seconds);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO search_cache \
                 (query_hash, query, results, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![query_hash(query), query, results, now as i64, expires_at as i64],
        )?;
        let swept = tx.execute(
            "DELETE FROM search_cache WHERE expires_at <= ?1 OR id NOT IN ( \
                 SELECT id FROM search_cache WHERE expires_at > ?1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2)",
            params![now as i64, self.max_entries as i64],
        )?;
        tx.commit()?;

        if swept > 0 {
            tracing::debug!(swept, "cache sweep removed entries");
        }
        Ok(())
    }

    /// Number of rows in the cache table, live or not.
    pub fn cache_len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM search_cache", [], |r| r.get(0))?;
        Ok(n.max(0) as usize)
    }

    /// Append one history row.
    pub fn append_history(&self, record: &SearchHistoryRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO search_history (query, results_count, processing_time, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.query,
                record.results_count as i64,
                record.processing_time_seconds,
                record.created_at as i64
            ],
        )?;
        Ok(())
    }

    /// Delete history rows created before `cutoff`. Returns the number removed.
    pub fn prune_history(&self, cutoff: u64) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM search_history WHERE created_at < ?1",
            params![cutoff as i64],
        )?;
        Ok(removed)
    }

    /// Number of history rows.
    pub fn history_len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM search_history", [], |r| r.get(0))?;
        Ok(n.max(0) as usize)
    }
}

impl ResultCache for SqliteStore {
    fn lookup(&self, query: &str) -> std::result::Result<Option<Vec<ResultItem>>, SearchError> {
        self.lookup_at(query, now_epoch_secs())
            .map_err(|e| SearchError::Cache(e.to_string()))
    }

    fn store(&self, query: &str, items: &[ResultItem]) -> std::result::Result<(), SearchError> {
        self.store_at(query, items, now_epoch_secs())
            .map_err(|e| SearchError::Cache(e.to_string()))
    }
}

impl HistorySink for SqliteStore {
    fn record(&self, entry: &SearchHistoryRecord) -> Result<()> {
        self.append_history(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfind_search::types::{ContentType, Quality};

    fn items(title: &str, seeds: u64) -> Vec<ResultItem> {
        vec![ResultItem {
            title: title.into(),
            size: "1.1 GB".into(),
            seeds,
            leeches: 3,
            source_id: "1337x".into(),
            content_type: ContentType::Movie,
            quality: Quality::P1080,
            magnet_link: Some("magnet:?xt=urn:btih:abc".into()),
            download_url: None,
            relevance_score: 0.75,
            retrieved_at_epoch_seconds: 1_700_000_000,
        }]
    }

    fn history(query: &str, created_at: u64) -> SearchHistoryRecord {
        SearchHistoryRecord {
            query: query.into(),
            results_count: 12,
            processing_time_seconds: 3.5,
            created_at,
        }
    }

    #[test]
    fn round_trip_within_ttl() {
        let store = SqliteStore::open_in_memory(100, 10).expect("open");
        store.store_at("Inception", &items("Inception 1080p", 500), 1_000).expect("store");
        let hit = store.lookup_at("  inception ", 1_050).expect("lookup");
        assert_eq!(hit, Some(items("Inception 1080p", 500)));
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let store = SqliteStore::open_in_memory(100, 10).expect("open");
        store.store_at("heat", &items("Heat 1995", 40), 1_000).expect("store");
        assert!(store.lookup_at("heat", 1_099).expect("lookup").is_some());
        assert!(store.lookup_at("heat", 1_100).expect("lookup").is_none());
    }

    #[test]
    fn store_upserts_same_query() {
        let store = SqliteStore::open_in_memory(100, 10).expect("open");
        store.store_at("heat", &items("Heat 1995 DVDRip", 4), 1_000).expect("store");
        store.store_at("HEAT", &items("Heat 1995 1080p", 80), 1_001).expect("store");
        assert_eq!(store.cache_len().expect("len"), 1);

        let entry = store.entry_at("heat", 1_002).expect("entry").expect("hit");
        assert_eq!(entry.query, "HEAT");
        assert_eq!(entry.created_at, 1_001);
        assert_eq!(entry.expires_at, 1_101);
        assert_eq!(entry.items, items("Heat 1995 1080p", 80));
    }

    #[test]
    fn eviction_keeps_most_recent() {
        let store = SqliteStore::open_in_memory(10_000, 3).expect("open");
        for n in 0..7u64 {
            store
                .store_at(&format!("query {n}"), &items("Some Title", n), 1_000 + n)
                .expect("store");
        }
        assert_eq!(store.cache_len().expect("len"), 3);
        for n in 0..4 {
            assert!(store.lookup_at(&format!("query {n}"), 1_010).expect("lookup").is_none());
        }
        for n in 4..7 {
            assert!(store.lookup_at(&format!("query {n}"), 1_010).expect("lookup").is_some());
        }
    }

    #[test]
    fn sweep_removes_expired_rows() {
        let store = SqliteStore::open_in_memory(10, 100).expect("open");
        store.store_at("old", &items("Old Title", 1), 0).expect("store");
        store.store_at("new", &items("New Title", 1), 500).expect("store");
        assert_eq!(store.cache_len().expect("len"), 1);
    }

    #[test]
    fn history_append_and_prune() {
        let store = SqliteStore::open_in_memory(100, 10).expect("open");
        store.append_history(&history("dune", 100)).expect("append");
        store.append_history(&history("dune", 200)).expect("append");
        store.append_history(&history("heat", 300)).expect("append");
        assert_eq!(store.history_len().expect("len"), 3);

        assert_eq!(store.prune_history(250).expect("prune"), 2);
        assert_eq!(store.history_len().expect("len"), 1);
    }

    #[test]
    fn trait_objects_share_one_store() {
        let store = std::sync::Arc::new(SqliteStore::open_in_memory(3_600, 10).expect("open"));
        let cache: std::sync::Arc<dyn ResultCache> = store.clone();
        let sink: std::sync::Arc<dyn HistorySink> = store.clone();

        cache.store("dune", &items("Dune 2021", 9)).expect("store");
        assert!(cache.lookup("DUNE").expect("lookup").is_some());
        sink.record(&history("dune", 1)).expect("record");
        assert_eq!(store.history_len().expect("len"), 1);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("cache.db");
        {
            let store = SqliteStore::open(&path, 3_600, 10).expect("open");
            store.store_at("ronin", &items("Ronin 1998", 30), 1_000).expect("store");
            store.append_history(&history("ronin", 1_000)).expect("append");
        }
        let reopened = SqliteStore::open(&path, 3_600, 10).expect("reopen");
        assert!(reopened.lookup_at("ronin", 1_001).expect("lookup").is_some());
        assert_eq!(reopened.history_len().expect("len"), 1);
    }
}
