//! Core types: canonical result items and the raw records adapters emit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical, source-agnostic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    /// Release title as published by the source (trimmed, at least 5 characters).
    pub title: String,
    /// Size in the source's own format, e.g. `"1.4 GB"`. `"N/A"` when unknown.
    pub size: String,
    /// Number of seeders; the main popularity signal.
    pub seeds: u64,
    /// Number of leechers.
    pub leeches: u64,
    /// Id of the [`SourceDescriptor`](crate::source::SourceDescriptor) that produced this item.
    pub source_id: String,
    /// Movie or series, derived from the title.
    pub content_type: ContentType,
    /// Release quality tag.
    pub quality: Quality,
    /// `magnet:` URI, when the source exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
    /// Direct `.torrent` download URL, when the source exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Composite relevance in `[0, 1]`. Zero until scored.
    #[serde(default)]
    pub relevance_score: f64,
    /// When the item was retrieved, in seconds since the Unix epoch.
    pub retrieved_at_epoch_seconds: u64,
}

impl ResultItem {
    /// The primary locator: the magnet URI if present, else the download URL.
    pub fn locator(&self) -> Option<&str> {
        self.magnet_link
            .as_deref()
            .or(self.download_url.as_deref())
    }
}

/// Broad content classification of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Release quality vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "BluRay")]
    BluRay,
    #[serde(rename = "WEB-DL")]
    WebDl,
    #[serde(rename = "HDTV")]
    Hdtv,
    #[serde(rename = "HDRip")]
    HdRip,
    #[serde(rename = "CAM")]
    Cam,
    #[serde(rename = "TS")]
    Telesync,
    #[serde(rename = "DVDRip")]
    DvdRip,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Quality {
    /// Returns the canonical tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uhd4k => "4K",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::BluRay => "BluRay",
            Self::WebDl => "WEB-DL",
            Self::Hdtv => "HDTV",
            Self::HdRip => "HDRip",
            Self::Cam => "CAM",
            Self::Telesync => "TS",
            Self::DvdRip => "DVDRip",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source-native record before normalisation.
///
/// The shape depends on how the source was retrieved.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// One torrent variant from a JSON API listing.
    Api(ApiRecord),
    /// Fields read from one result node of an HTML listing page.
    Listing(ListingRecord),
}

impl RawRecord {
    pub fn title(&self) -> &str {
        match self {
            Self::Api(r) => &r.title,
            Self::Listing(r) => &r.title,
        }
    }
}

/// A single quality variant of an API movie entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRecord {
    pub title: String,
    pub size: Option<String>,
    pub seeds: u64,
    pub leeches: u64,
    /// Quality label reported by the API, e.g. `"1080p"`.
    pub quality: Option<String>,
    pub download_url: Option<String>,
}

/// Text extracted from one HTML result node.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub title: String,
    pub size: Option<String>,
    pub seeds: u64,
    pub leeches: u64,
    pub magnet_link: Option<String>,
}

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn now_epoch_secs() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    }
}
