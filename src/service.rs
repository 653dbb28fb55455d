//! The search service: cache, expansion, retrieval, ranking and persistence
//! composed behind one [`SearchService::search`] call.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use seedfind_search::types::now_epoch_secs;
use seedfind_search::{
    Adapters, Orchestrator, RankingMode, ResultCache, ResultItem, SearchConfig, SourceAdapter,
    SourceDescriptor, rank, select_sources,
};

use crate::ai::{QueryExpander, TextGenerator, generator_from_config};
use crate::config::AppConfig;
use crate::error::{Result, ServiceError};
use crate::persist::{PersistJob, PersistWorker};
use crate::store::{HistorySink, SearchHistoryRecord, SqliteStore};
use crate::types::{SearchRequest, SearchResponse, ServiceStatus, SiteInfo};

/// Everything a [`SearchService`] is assembled from.
pub struct ServiceParts<A> {
    pub adapter: A,
    pub search: SearchConfig,
    /// Source catalog, in selection order.
    pub sources: Vec<SourceDescriptor>,
    pub generator: Arc<dyn TextGenerator>,
    /// Variant cap for query expansion, original included.
    pub max_variants: usize,
    pub cache: Arc<dyn ResultCache>,
    pub history: Arc<dyn HistorySink>,
}

/// Long-lived search front end.
///
/// Holds one orchestrator, so the outbound request cap is shared by every
/// request and every query variant the service handles.
pub struct SearchService<A: SourceAdapter = Adapters> {
    orchestrator: Orchestrator<A>,
    sources: Vec<SourceDescriptor>,
    expander: QueryExpander,
    cache: Arc<dyn ResultCache>,
    persist: PersistWorker,
}

impl SearchService<Adapters> {
    /// Build the production service: real adapters, the SQLite store at the
    /// configured path, and the configured AI provider.
    ///
    /// Must be called inside a Tokio runtime; the persistence worker is
    /// spawned immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP clients
    /// cannot be built, or the database cannot be opened.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let db_path = config.cache.resolved_db_path();
        let store = Arc::new(SqliteStore::open(
            &db_path,
            config.cache.ttl_seconds,
            config.cache.max_entries,
        )?);
        debug!(path = %db_path.display(), "cache database opened");

        let adapter = Adapters::new(&config.search)?;
        Ok(Self::new(ServiceParts {
            adapter,
            search: config.search.clone(),
            sources: config.sources(),
            generator: Arc::from(generator_from_config(&config.ai)),
            max_variants: config.ai.max_variants,
            cache: store.clone(),
            history: store,
        }))
    }

    /// Stop the background writer after its queued jobs and close the
    /// browser session, if one was opened.
    pub async fn shutdown(&self) {
        self.close_writer().await;
        self.orchestrator.adapter().shutdown().await;
    }
}

impl<A: SourceAdapter> SearchService<A> {
    /// Assemble a service from its parts. Spawns the persistence worker on
    /// the current Tokio runtime.
    pub fn new(parts: ServiceParts<A>) -> Self {
        let ServiceParts {
            adapter,
            search,
            sources,
            generator,
            max_variants,
            cache,
            history,
        } = parts;

        Self {
            orchestrator: Orchestrator::new(adapter, search),
            sources,
            expander: QueryExpander::new(generator, max_variants),
            persist: PersistWorker::spawn(Arc::clone(&cache), history),
            cache,
        }
    }

    /// Whether query expansion and scored ranking are available.
    pub fn ai_enabled(&self) -> bool {
        self.expander.is_enabled()
    }

    /// Run one search.
    ///
    /// A cache hit returns immediately with `cached = true`. Otherwise the
    /// query is expanded (when AI is requested and available), every variant
    /// is retrieved concurrently from the selected sources, and the merged
    /// list is ranked against the original query. The result list and a
    /// history row are written in the background.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty query. Source,
    /// cache and AI failures only degrade the response.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation("query must not be empty".into()));
        }

        info!(
            query,
            mode = %request.mode,
            max_sites = request.max_sites,
            use_ai = request.use_ai,
            "search started"
        );

        if request.mode.reads_cache() {
            if let Some(items) = self.cached(query).await {
                let ai_processed = items.iter().any(|i| i.relevance_score > 0.0);
                let elapsed = started.elapsed().as_secs_f64();
                info!(results = items.len(), "cache hit");
                return Ok(SearchResponse::new(query, items, true, ai_processed, None, elapsed));
            }
        }

        let ai_active = request.use_ai && self.expander.is_enabled();
        let variants = if ai_active {
            self.expander.expand(query).await
        } else {
            vec![query.to_owned()]
        };

        let selected = select_sources(&self.sources, request.max_sites);
        let items = self.retrieve_all(&variants, &selected).await;

        let mode = if ai_active {
            RankingMode::Scored
        } else {
            RankingMode::Seeds
        };
        let results = rank(
            items,
            query,
            &self.sources,
            mode,
            self.orchestrator.config().max_results,
        );
        let elapsed = started.elapsed().as_secs_f64();

        self.persist.submit(PersistJob::Cache {
            query: query.to_owned(),
            items: results.clone(),
        });
        self.persist.submit(PersistJob::History(SearchHistoryRecord {
            query: query.to_owned(),
            results_count: results.len(),
            processing_time_seconds: elapsed,
            created_at: now_epoch_secs(),
        }));

        info!(
            results = results.len(),
            variants = variants.len(),
            sources = selected.len(),
            elapsed_secs = elapsed,
            "search finished"
        );
        Ok(SearchResponse::new(
            query,
            results,
            false,
            ai_active,
            Some(variants.len()),
            elapsed,
        ))
    }

    /// The source catalog with activity, reliability and kind.
    pub fn sites(&self) -> Vec<SiteInfo> {
        self.sources.iter().map(SiteInfo::from).collect()
    }

    /// Version, AI availability and active source count.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            ai_enabled: self.expander.is_enabled(),
            sites_available: self.sources.iter().filter(|s| s.active).count(),
        }
    }

    /// Wait for every background write queued so far. The service stays
    /// fully usable afterwards.
    pub async fn flush(&self) {
        self.persist.flush().await;
    }

    /// Finish queued writes and stop the background writer. Searches made
    /// after this still answer but are no longer cached or recorded.
    pub async fn close_writer(&self) {
        self.persist.shutdown().await;
    }

    /// Live cached items for `query`. Errors and empty lists count as misses.
    async fn cached(&self, query: &str) -> Option<Vec<ResultItem>> {
        let cache = Arc::clone(&self.cache);
        let key = query.to_owned();
        match tokio::task::spawn_blocking(move || cache.lookup(&key)).await {
            Ok(Ok(Some(items))) if !items.is_empty() => Some(items),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(error = %e, "cache lookup failed; treating as miss");
                None
            }
            Err(e) => {
                warn!(error = %e, "cache lookup task failed; treating as miss");
                None
            }
        }
    }

    /// Retrieve every variant concurrently and concatenate the normalised
    /// items in variant order.
    async fn retrieve_all(
        &self,
        variants: &[String],
        selected: &[SourceDescriptor],
    ) -> Vec<ResultItem> {
        let retrievals = join_all(
            variants
                .iter()
                .map(|variant| self.orchestrator.retrieve(variant, selected)),
        )
        .await;

        let retrieved_at = now_epoch_secs();
        let mut items = Vec::new();
        for (variant, retrieval) in variants.iter().zip(retrievals) {
            debug!(
                variant = %variant,
                records = retrieval.record_count(),
                failed_sources = retrieval.failures.len(),
                "variant retrieved"
            );
            items.extend(retrieval.into_items(retrieved_at));
        }
        items
    }
}
