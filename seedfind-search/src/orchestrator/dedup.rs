//! Result deduplication by normalised title.
//!
//! Two items collide when their titles match after lower-casing and
//! removing all whitespace. The first occurrence is kept and later ones
//! are dropped, regardless of source, quality or seed count.

use std::collections::HashSet;

use crate::types::ResultItem;

/// Lower-cased title with every whitespace character removed.
pub fn dedup_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Drop items whose [`dedup_key`] was already seen. Order is preserved.
pub fn deduplicate(items: Vec<ResultItem>) -> Vec<ResultItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let before = items.len();
    let kept: Vec<ResultItem> = items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(&item.title)))
        .collect();
    tracing::debug!(before, after = kept.len(), "deduplicated by title");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, Quality};

    fn item(title: &str, source: &str, seeds: u64) -> ResultItem {
        ResultItem {
            title: title.into(),
            size: "N/A".into(),
            seeds,
            leeches: 0,
            source_id: source.into(),
            content_type: ContentType::Movie,
            quality: Quality::Unknown,
            magnet_link: None,
            download_url: None,
            relevance_score: 0.0,
            retrieved_at_epoch_seconds: 0,
        }
    }

    #[test]
    fn key_ignores_case_and_whitespace() {
        assert_eq!(dedup_key("Inception 1080p BluRay"), "inception1080pbluray");
        assert_eq!(dedup_key(" inception\t1080p  bluray "), "inception1080pbluray");
        assert_ne!(dedup_key("Inception 1080p"), dedup_key("Inception.1080p"));
    }

    #[test]
    fn first_occurrence_wins() {
        let items = vec![
            item("Inception 1080p BluRay", "1337x", 500),
            item("inception 1080p bluray", "rarbg", 10),
        ];
        let out = deduplicate(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].seeds, 500);
        assert_eq!(out[0].source_id, "1337x");
    }

    #[test]
    fn later_duplicate_dropped_even_with_more_seeds() {
        let items = vec![item("Heat 1995", "a", 1), item("HEAT  1995", "b", 9_000)];
        let out = deduplicate(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].seeds, 1);
    }

    #[test]
    fn distinct_titles_keep_order() {
        let items = vec![
            item("Ronin 1998", "a", 3),
            item("Heat 1995", "a", 2),
            item("Ronin 1998", "b", 1),
            item("Collateral 2004", "b", 5),
        ];
        let titles: Vec<_> = deduplicate(items).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, ["Ronin 1998", "Heat 1995", "Collateral 2004"]);
    }

    #[test]
    fn empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}
