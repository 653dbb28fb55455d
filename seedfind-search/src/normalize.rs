//! Raw record → canonical [`ResultItem`] mapping.
//!
//! Pure functions: title floor, movie/series classification and quality
//! tag detection. Records whose trimmed title is shorter than
//! [`MIN_TITLE_CHARS`] are discarded here and never reach the ranker.

use std::sync::OnceLock;

use regex::Regex;

use crate::source::SourceDescriptor;
use crate::types::{ContentType, Quality, RawRecord, ResultItem};

/// Minimum number of characters in a trimmed title.
pub const MIN_TITLE_CHARS: usize = 5;

/// Size shown when a source does not report one.
pub const UNKNOWN_SIZE: &str = "N/A";

/// Substrings of a lower-cased title that mark a series.
const SERIES_WORDS: &[&str] = &[
    "season",
    "episode",
    "series",
    "temporada",
    "episódio",
    "episodio",
    "saison",
    "staffel",
];

/// Quality patterns in priority order; the first match wins.
const QUALITY_PATTERNS: &[(&str, Quality)] = &[
    (r"(?i)\b(4k|2160p)\b", Quality::Uhd4k),
    (r"(?i)\b1080p\b", Quality::P1080),
    (r"(?i)\b720p\b", Quality::P720),
    (r"(?i)\b480p\b", Quality::P480),
    (r"(?i)\bblu-?ray\b", Quality::BluRay),
    (r"(?i)\bweb-?dl\b", Quality::WebDl),
    (r"(?i)\bhdtv\b", Quality::Hdtv),
    (r"(?i)\bhdrip\b", Quality::HdRip),
    (r"(?i)\bcam\b", Quality::Cam),
    (r"(?i)\bts\b", Quality::Telesync),
    (r"(?i)\bdvdrip\b", Quality::DvdRip),
];

fn quality_regexes() -> &'static [(Regex, Quality)] {
    static COMPILED: OnceLock<Vec<(Regex, Quality)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        QUALITY_PATTERNS
            .iter()
            .filter_map(|(pattern, quality)| Regex::new(pattern).ok().map(|re| (re, *quality)))
            .collect()
    })
}

fn episode_marker() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"(?i)\bs\d{1,2}(e\d{1,3})?\b").ok())
        .as_ref()
}

/// Classify a title as [`ContentType::Series`] or [`ContentType::Movie`].
pub fn classify_content(title: &str) -> ContentType {
    let lowered = title.to_lowercase();
    let is_series = SERIES_WORDS.iter().any(|w| lowered.contains(w))
        || episode_marker().is_some_and(|re| re.is_match(&lowered));
    if is_series {
        ContentType::Series
    } else {
        ContentType::Movie
    }
}

/// Detect the release quality from a title.
pub fn detect_quality(title: &str) -> Quality {
    quality_regexes()
        .iter()
        .find(|(re, _)| re.is_match(title))
        .map(|(_, quality)| *quality)
        .unwrap_or(Quality::Unknown)
}

/// Map one raw record to a canonical item, or `None` if it is unusable.
pub fn normalize(
    record: RawRecord,
    source: &SourceDescriptor,
    retrieved_at: u64,
) -> Option<ResultItem> {
    let title = record.title().trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        tracing::debug!(source = %source.id, title, "discarding short title");
        return None;
    }
    let title = title.to_owned();

    let item = match record {
        RawRecord::Api(api) => {
            let quality = api
                .quality
                .as_deref()
                .map(detect_quality)
                .filter(|q| *q != Quality::Unknown)
                .unwrap_or_else(|| detect_quality(&title));
            ResultItem {
                size: api.size.unwrap_or_else(|| UNKNOWN_SIZE.to_owned()),
                seeds: api.seeds,
                leeches: api.leeches,
                source_id: source.id.clone(),
                content_type: ContentType::Movie,
                quality,
                magnet_link: None,
                download_url: api.download_url,
                relevance_score: 0.0,
                retrieved_at_epoch_seconds: retrieved_at,
                title,
            }
        }
        RawRecord::Listing(listing) => ResultItem {
            content_type: classify_content(&title),
            quality: detect_quality(&title),
            size: listing.size.unwrap_or_else(|| UNKNOWN_SIZE.to_owned()),
            seeds: listing.seeds,
            leeches: listing.leeches,
            source_id: source.id.clone(),
            magnet_link: listing.magnet_link,
            download_url: None,
            relevance_score: 0.0,
            retrieved_at_epoch_seconds: retrieved_at,
            title,
        },
    };
    Some(item)
}

/// Normalise a batch of records from one source, dropping unusable ones.
pub fn normalize_batch(
    records: Vec<RawRecord>,
    source: &SourceDescriptor,
    retrieved_at: u64,
) -> Vec<ResultItem> {
    records
        .into_iter()
        .filter_map(|r| normalize(r, source, retrieved_at))
        .collect()
}
