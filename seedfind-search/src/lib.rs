//! # seedfind-search
//!
//! Concurrent retrieval of torrent listings from several public indexes,
//! merged into one ranked result list.
//!
//! ## Design
//!
//! - Three adapter kinds: JSON API, static HTML listing, script-rendered
//!   listing driven through a WebDriver headless browser
//! - One process-wide semaphore caps outbound requests across all sources
//!   and all concurrent query variants; each call waits a random delay first
//! - A failing or slow source contributes nothing and never aborts the rest
//! - Results are normalised, deduplicated by title and ranked by a pure
//!   relevance formula (or by seeds when scoring is off)
//! - A cache contract with TTL and bounded, oldest-first eviction
//!
//! ## Security
//!
//! - No network listeners; this is a library
//! - Query text is logged only at trace level

pub mod adapter;
pub mod adapters;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod orchestrator;
pub mod source;
pub mod types;

pub use adapter::SourceAdapter;
pub use adapters::Adapters;
pub use cache::{query_hash, MemoryCache, ResultCache};
pub use config::{BrowserConfig, SearchConfig};
pub use error::{Result, SearchError};
pub use orchestrator::{rank, select_sources, Orchestrator, RankingMode, Retrieval};
pub use source::{builtin_sources, SourceDescriptor, SourceKind, SourceStrategy};
pub use types::{ContentType, Quality, RawRecord, ResultItem};

/// Search every active built-in source once and return scored results.
///
/// Builds a one-off [`Orchestrator`] over the production [`Adapters`],
/// ranks in [`RankingMode::Scored`] and closes any browser session it
/// opened. Long-lived callers should keep their own orchestrator so the
/// concurrency cap and browser session are shared between searches.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid. Source failures
/// are logged and only shrink the result list.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> seedfind_search::Result<()> {
/// let config = seedfind_search::SearchConfig::default();
/// let results = seedfind_search::search("big buck bunny", &config).await?;
/// for item in &results {
///     println!("{} ({} seeds)", item.title, item.seeds);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &SearchConfig) -> Result<Vec<ResultItem>> {
    config.validate()?;
    let sources = builtin_sources();
    let selected = select_sources(&sources, sources.len());

    let orchestrator = Orchestrator::new(Adapters::new(config)?, config.clone());
    let retrieval = orchestrator.retrieve(query, &selected).await;
    orchestrator.adapter().shutdown().await;

    let items = retrieval.into_items(types::now_epoch_secs());
    Ok(rank(
        items,
        query,
        &sources,
        RankingMode::Scored,
        config.max_results,
    ))
}
