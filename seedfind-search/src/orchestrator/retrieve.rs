//! Concurrent fan-out of one query to many sources.
//!
//! Every adapter call first takes a permit from a process-wide
//! [`Semaphore`], sleeps a random politeness delay while holding it, then
//! runs under a per-call timeout. Failures are captured per source so one
//! slow or broken index never cancels its siblings.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;

use crate::adapter::SourceAdapter;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::normalize::normalize_batch;
use crate::source::SourceDescriptor;
use crate::types::{RawRecord, ResultItem};

/// Raw records returned by one source.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: SourceDescriptor,
    pub records: Vec<RawRecord>,
}

/// A source that contributed nothing because its call failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: String,
}

/// Outcome of one fan-out: successful batches plus non-fatal failures.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub batches: Vec<SourceBatch>,
    pub failures: Vec<SourceFailure>,
}

impl Retrieval {
    /// Total raw records across all successful sources.
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }

    /// Normalise every batch against its own descriptor.
    pub fn into_items(self, retrieved_at: u64) -> Vec<ResultItem> {
        self.batches
            .into_iter()
            .flat_map(|batch| normalize_batch(batch.records, &batch.source, retrieved_at))
            .collect()
    }
}

/// Active sources, capped to the first `max_sites` in catalog order.
pub fn select_sources(sources: &[SourceDescriptor], max_sites: usize) -> Vec<SourceDescriptor> {
    sources
        .iter()
        .filter(|s| s.active)
        .take(max_sites)
        .cloned()
        .collect()
}

/// Drives a [`SourceAdapter`] across many sources under a shared cap.
///
/// Clones share the same adapter and the same limiter, so concurrent
/// [`retrieve`](Self::retrieve) calls for different query variants never
/// exceed `max_concurrent_requests` outbound calls in aggregate.
pub struct Orchestrator<A> {
    adapter: Arc<A>,
    limiter: Arc<Semaphore>,
    config: SearchConfig,
}

impl<A> Clone for Orchestrator<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            limiter: Arc::clone(&self.limiter),
            config: self.config.clone(),
        }
    }
}

impl<A: SourceAdapter> Orchestrator<A> {
    pub fn new(adapter: A, config: SearchConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self {
            adapter: Arc::new(adapter),
            limiter,
            config,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Permits currently free on the shared limiter.
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Query every given source once and collect the outcomes.
    ///
    /// Never fails: a source whose call errors or times out is recorded in
    /// [`Retrieval::failures`] and contributes no records.
    pub async fn retrieve(&self, query: &str, sources: &[SourceDescriptor]) -> Retrieval {
        let calls = sources.iter().map(|source| async move {
            let outcome = self.fetch_one(query, source).await;
            (source, outcome)
        });
        let outcomes = futures::future::join_all(calls).await;

        let mut retrieval = Retrieval::default();
        for (source, outcome) in outcomes {
            match outcome {
                Ok(records) => {
                    tracing::debug!(
                        source = %source.id,
                        count = records.len(),
                        "source returned records"
                    );
                    retrieval.batches.push(SourceBatch {
                        source: source.clone(),
                        records,
                    });
                }
                Err(err) => {
                    tracing::warn!(source = %source.id, error = %err, "source query failed");
                    retrieval.failures.push(SourceFailure {
                        source_id: source.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        retrieval
    }

    async fn fetch_one(
        &self,
        query: &str,
        source: &SourceDescriptor,
    ) -> Result<Vec<RawRecord>, SearchError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| SearchError::Config("request limiter closed".into()))?;

        let delay = jitter(self.config.request_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let limit = Duration::from_secs(self.config.timeout_seconds);
        match tokio::time::timeout(limit, self.adapter.fetch(query, source)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(format!(
                "{} gave no answer within {}s",
                source.id, self.config.timeout_seconds
            ))),
        }
    }
}

fn jitter((min, max): (u64, u64)) -> Duration {
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}
