//! Final ordering of merged results.
//!
//! Scored mode: dedup → score → sort by ranking key → quality floor →
//! truncate. Seeds mode (AI disabled): dedup → sort by seeds → truncate,
//! with every relevance score left at zero.

use std::cmp::Ordering;

use crate::source::SourceDescriptor;
use crate::types::ResultItem;

use super::dedup::deduplicate;
use super::scoring::{popularity, score_items};

/// Items at or below this score are candidates for the floor.
pub const FLOOR_SCORE: f64 = 0.3;

/// Items at or below this many seeds are candidates for the floor.
pub const FLOOR_SEEDS: u64 = 10;

/// How the merged list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Relevance formula, ranking key and quality floor.
    Scored,
    /// Plain descending seed count; no scores, no floor.
    Seeds,
}

/// `0.7 × relevance + 0.3 × popularity`.
pub fn ranking_key(item: &ResultItem) -> f64 {
    0.7 * item.relevance_score + 0.3 * popularity(item.seeds)
}

/// Drop items that are both weakly relevant and poorly seeded.
pub fn apply_quality_floor(items: Vec<ResultItem>) -> Vec<ResultItem> {
    items
        .into_iter()
        .filter(|i| i.relevance_score > FLOOR_SCORE || i.seeds > FLOOR_SEEDS)
        .collect()
}

/// Rank merged items for `query`.
///
/// `query` is the original, unexpanded query. `sources` supplies the
/// reliability weights; unknown source ids weigh 0.5. Sorting is stable, so
/// ties keep their merged order.
pub fn rank(
    items: Vec<ResultItem>,
    query: &str,
    sources: &[SourceDescriptor],
    mode: RankingMode,
    max_results: usize,
) -> Vec<ResultItem> {
    let unique = deduplicate(items);

    let mut ranked = match mode {
        RankingMode::Scored => {
            let mut scored = score_items(unique, query, sources);
            scored.sort_by(|a, b| {
                ranking_key(b)
                    .partial_cmp(&ranking_key(a))
                    .unwrap_or(Ordering::Equal)
            });
            let before = scored.len();
            let kept = apply_quality_floor(scored);
            tracing::debug!(before, after = kept.len(), "quality floor applied");
            kept
        }
        RankingMode::Seeds => {
            let mut by_seeds = unique;
            by_seeds.sort_by(|a, b| b.seeds.cmp(&a.seeds));
            by_seeds
        }
    };

    ranked.truncate(max_results);
    ranked
}
