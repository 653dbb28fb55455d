//! Background persistence of cache entries and history rows.
//!
//! The search path submits a [`PersistJob`] and returns immediately. A
//! single worker task drains the queue in order, running each write on the
//! blocking pool. A failed write is logged and dropped; it never reaches
//! the caller whose response has already been returned.
//!
//! [`PersistWorker::flush`] waits for everything queued so far and leaves the
//! queue open; [`PersistWorker::shutdown`] closes it for good.

use std::sync::{Arc, Mutex, PoisonError};

use seedfind_search::{ResultCache, ResultItem};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::store::{HistorySink, SearchHistoryRecord};

/// One deferred write.
#[derive(Debug, Clone)]
pub enum PersistJob {
    /// Upsert the final result list for a query.
    Cache { query: String, items: Vec<ResultItem> },
    /// Append a history row.
    History(SearchHistoryRecord),
}

impl PersistJob {
    fn label(&self) -> &'static str {
        match self {
            Self::Cache { .. } => "cache",
            Self::History(_) => "history",
        }
    }
}

enum Message {
    Job(PersistJob),
    /// Answered once every job queued before it has been applied.
    Barrier(oneshot::Sender<()>),
}

/// Owns the write queue and the task draining it.
pub struct PersistWorker {
    tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PersistWorker {
    /// Start the worker on the current Tokio runtime.
    pub fn spawn(cache: Arc<dyn ResultCache>, history: Arc<dyn HistorySink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(rx, cache, history));
        Self {
            tx: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queue a job. Returns `false` once the worker has been shut down.
    pub fn submit(&self, job: PersistJob) -> bool {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(Message::Job(job)).is_ok(),
            None => {
                debug!(job = job.label(), "persist worker stopped; job dropped");
                false
            }
        }
    }

    /// Wait until every job submitted so far has been applied. The queue
    /// stays open. Returns immediately once the worker has been shut down.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        let sent = {
            let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
            guard
                .as_ref()
                .is_some_and(|tx| tx.send(Message::Barrier(done_tx)).is_ok())
        };
        if sent {
            let _ = done_rx.await;
        }
    }

    /// Close the queue, let the worker finish every queued job, then join it.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().unwrap_or_else(PoisonError::into_inner).take());
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "persist worker task failed");
            }
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Message>,
    cache: Arc<dyn ResultCache>,
    history: Arc<dyn HistorySink>,
) {
    while let Some(message) = rx.recv().await {
        let job = match message {
            Message::Job(job) => job,
            Message::Barrier(done) => {
                let _ = done.send(());
                continue;
            }
        };
        let label = job.label();
        let cache = Arc::clone(&cache);
        let history = Arc::clone(&history);
        let outcome =
            tokio::task::spawn_blocking(move || apply(job, cache.as_ref(), history.as_ref()))
                .await;
        match outcome {
            Ok(Ok(())) => debug!(job = label, "persisted"),
            Ok(Err(e)) => warn!(job = label, error = %e, "background write failed"),
            Err(e) => warn!(job = label, error = %e, "background write panicked"),
        }
    }
    debug!("persist queue closed");
}

fn apply(
    job: PersistJob,
    cache: &dyn ResultCache,
    history: &dyn HistorySink,
) -> Result<(), ServiceError> {
    match job {
        PersistJob::Cache { query, items } => Ok(cache.store(&query, &items)?),
        PersistJob::History(record) => history.record(&record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use seedfind_search::SearchError;

    struct BrokenCache;

    impl ResultCache for BrokenCache {
        fn lookup(&self, _query: &str) -> Result<Option<Vec<ResultItem>>, SearchError> {
            Err(SearchError::Cache("disk on fire".into()))
        }
        fn store(&self, _query: &str, _items: &[ResultItem]) -> Result<(), SearchError> {
            Err(SearchError::Cache("disk on fire".into()))
        }
    }

    fn record(query: &str) -> SearchHistoryRecord {
        SearchHistoryRecord {
            query: query.into(),
            results_count: 0,
            processing_time_seconds: 0.5,
            created_at: 10,
        }
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let store = Arc::new(SqliteStore::open_in_memory(3_600, 10).expect("open"));
        let worker = PersistWorker::spawn(store.clone(), store.clone());

        for n in 0..5 {
            assert!(worker.submit(PersistJob::History(record(&format!("q{n}")))));
        }
        assert!(worker.submit(PersistJob::Cache {
            query: "dune".into(),
            items: Vec::new(),
        }));
        worker.shutdown().await;

        assert_eq!(store.history_len().expect("len"), 5);
        assert_eq!(store.cache_len().expect("len"), 1);
    }

    #[tokio::test]
    async fn flush_waits_and_keeps_queue_open() {
        let store = Arc::new(SqliteStore::open_in_memory(3_600, 10).expect("open"));
        let worker = PersistWorker::spawn(store.clone(), store.clone());

        assert!(worker.submit(PersistJob::History(record("first"))));
        worker.flush().await;
        assert_eq!(store.history_len().expect("len"), 1);

        assert!(worker.submit(PersistJob::History(record("second"))));
        worker.flush().await;
        assert_eq!(store.history_len().expect("len"), 2);

        worker.shutdown().await;
        // No worker left to answer; must not hang.
        worker.flush().await;
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory(3_600, 10).expect("open"));
        let worker = PersistWorker::spawn(store.clone(), store);
        worker.shutdown().await;
        assert!(!worker.submit(PersistJob::History(record("late"))));
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_worker() {
        let store = Arc::new(SqliteStore::open_in_memory(3_600, 10).expect("open"));
        let worker = PersistWorker::spawn(Arc::new(BrokenCache), store.clone());

        assert!(worker.submit(PersistJob::Cache {
            query: "dune".into(),
            items: Vec::new(),
        }));
        assert!(worker.submit(PersistJob::History(record("dune"))));
        worker.shutdown().await;

        assert_eq!(store.history_len().expect("len"), 1);
    }
}
