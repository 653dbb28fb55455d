//! Composite relevance scoring.
//!
//! ```text
//! score = 0.3 × (query words found in title)
//!       + 0.2 × quality weight (first matching tag)
//!       + 0.3 × min(seeds / 100, 1)
//!       + 0.2 × source reliability
//! ```
//!
//! clamped to `[0, 1]`. The function is pure: the same item, query and
//! source catalog always give the same score.

use crate::source::{reliability_of, SourceDescriptor};
use crate::types::ResultItem;

const TEXT_MATCH_WEIGHT: f64 = 0.3;
const QUALITY_WEIGHT: f64 = 0.2;
const POPULARITY_WEIGHT: f64 = 0.3;
const TRUST_WEIGHT: f64 = 0.2;

/// Seeds at which the popularity signal saturates.
pub const SEEDS_SATURATION: f64 = 100.0;

/// Tag substrings and their weights, scanned in this order.
///
/// Matched as plain substrings on purpose, so `"ts"` also hits "nights".
/// [`detect_quality`](crate::normalize::detect_quality) needs word
/// boundaries; the two are intentionally not aligned.
const QUALITY_TAG_WEIGHTS: &[(&str, f64)] = &[
    ("4k", 1.0),
    ("2160p", 1.0),
    ("1080p", 0.8),
    ("bluray", 0.9),
    ("720p", 0.6),
    ("web-dl", 0.7),
    ("480p", 0.4),
    ("hdtv", 0.5),
    ("cam", 0.1),
    ("ts", 0.1),
];

/// `min(seeds / 100, 1)`.
pub fn popularity(seeds: u64) -> f64 {
    (seeds as f64 / SEEDS_SATURATION).min(1.0)
}

/// Weight of the first tag found in the lower-cased title, or 0.
pub fn quality_weight(lowered_title: &str) -> f64 {
    QUALITY_TAG_WEIGHTS
        .iter()
        .find(|(tag, _)| lowered_title.contains(tag))
        .map_or(0.0, |(_, weight)| *weight)
}

/// Number of whitespace-separated query words contained in the title.
pub fn matched_words(lowered_title: &str, query: &str) -> usize {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| lowered_title.contains(word))
        .count()
}

/// Relevance of one item for `query`, given its source's reliability.
pub fn relevance_score(item: &ResultItem, query: &str, reliability: f64) -> f64 {
    let title = item.title.to_lowercase();
    let score = TEXT_MATCH_WEIGHT * matched_words(&title, query) as f64
        + QUALITY_WEIGHT * quality_weight(&title)
        + POPULARITY_WEIGHT * popularity(item.seeds)
        + TRUST_WEIGHT * reliability;
    score.clamp(0.0, 1.0)
}

/// Set `relevance_score` on every item, looking up reliability by source id.
pub fn score_items(
    mut items: Vec<ResultItem>,
    query: &str,
    sources: &[SourceDescriptor],
) -> Vec<ResultItem> {
    for item in &mut items {
        let reliability = reliability_of(sources, &item.source_id);
        item.relevance_score = relevance_score(item, query, reliability);
    }
    items
}
