//! Query result cache contract and an in-process implementation.
//!
//! Entries are keyed by [`query_hash`] of the trimmed, lower-cased query.
//! An entry is live while `now < expires_at`. Every store upserts and then
//! sweeps once: expired entries go first, then the oldest-by-creation
//! entries beyond the configured maximum.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SearchError;
use crate::types::{now_epoch_secs, ResultItem};

/// Default time-to-live: six hours.
pub const DEFAULT_TTL_SECONDS: u64 = 6 * 60 * 60;

/// Default live-entry bound.
pub const DEFAULT_MAX_ENTRIES: usize = 1_000;

/// Deterministic key for a query: blake3 hex of `query.trim().to_lowercase()`.
pub fn query_hash(query: &str) -> String {
    let normalised = query.trim().to_lowercase();
    blake3::hash(normalised.as_bytes()).to_hex().to_string()
}

/// One cached result list.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub query: String,
    pub items: Vec<ResultItem>,
    pub created_at: u64,
    pub expires_at: u64,
}

impl CacheEntry {
    pub fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// Lookup/store contract shared by the in-memory and persistent caches.
///
/// Methods are synchronous; async callers run them on a blocking thread
/// when the backing store does IO.
pub trait ResultCache: Send + Sync {
    /// The cached list for `query`, or `None` on a miss or expired entry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cache`] if the backing store cannot be read.
    fn lookup(&self, query: &str) -> Result<Option<Vec<ResultItem>>, SearchError>;

    /// Upsert `items` for `query` and run the eviction sweep.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cache`] if the backing store cannot be written.
    fn store(&self, query: &str, items: &[ResultItem]) -> Result<(), SearchError>;
}

struct Slot {
    entry: CacheEntry,
    /// Insertion sequence; breaks ties between entries created in the same second.
    seq: u64,
}

#[derive(Default)]
struct Slots {
    map: HashMap<String, Slot>,
    next_seq: u64,
}

/// A bounded, TTL-checked cache held in process memory.
pub struct MemoryCache {
    ttl_seconds: u64,
    max_entries: usize,
    slots: Mutex<Slots>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS, DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCache {
    pub fn new(ttl_seconds: u64, max_entries: usize) -> Self {
        Self {
            ttl_seconds,
            max_entries,
            slots: Mutex::new(Slots::default()),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.slots().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// [`ResultCache::lookup`] at an explicit clock reading.
    pub fn lookup_at(&self, query: &str, now: u64) -> Option<Vec<ResultItem>> {
        let slots = self.slots();
        slots
            .map
            .get(&query_hash(query))
            .filter(|slot| slot.entry.is_live(now))
            .map(|slot| slot.entry.items.clone())
    }

    /// [`ResultCache::store`] at an explicit clock reading.
    pub fn store_at(&self, query: &str, items: &[ResultItem], now: u64) {
        let mut slots = self.slots();
        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots.map.insert(
            query_hash(query),
            Slot {
                entry: CacheEntry {
                    query: query.to_owned(),
                    items: items.to_vec(),
                    created_at: now,
                    expires_at: now.saturating_add(self.ttl_seconds),
                },
                seq,
            },
        );
        sweep(&mut slots.map, now, self.max_entries);
    }
}

fn sweep(map: &mut HashMap<String, Slot>, now: u64, max_entries: usize) {
    map.retain(|_, slot| slot.entry.is_live(now));
    if map.len() <= max_entries {
        return;
    }

    let mut by_age: Vec<(u64, u64, String)> = map
        .iter()
        .map(|(key, slot)| (slot.entry.created_at, slot.seq, key.clone()))
        .collect();
    by_age.sort_unstable();
    let excess = map.len() - max_entries;
    for (_, _, key) in by_age.into_iter().take(excess) {
        map.remove(&key);
    }
}

impl ResultCache for MemoryCache {
    fn lookup(&self, query: &str) -> Result<Option<Vec<ResultItem>>, SearchError> {
        Ok(self.lookup_at(query, now_epoch_secs()))
    }

    fn store(&self, query: &str, items: &[ResultItem]) -> Result<(), SearchError> {
        self.store_at(query, items, now_epoch_secs());
        Ok(())
    }
}
