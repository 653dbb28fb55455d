//! Retrieval orchestrator and ranking pipeline.
//!
//! [`retrieve`] fans a query out to every selected source under a shared
//! concurrency cap. The remaining modules turn the merged, normalised items
//! into a final ordered list: title dedup, relevance scoring, then ranking
//! with a quality floor (or a plain seeds sort when scoring is off).

pub mod dedup;
pub mod rank;
pub mod retrieve;
pub mod scoring;

pub use dedup::{dedup_key, deduplicate};
pub use rank::{apply_quality_floor, rank, ranking_key, RankingMode};
pub use retrieve::{select_sources, Orchestrator, Retrieval, SourceBatch, SourceFailure};
pub use scoring::{relevance_score, score_items};
