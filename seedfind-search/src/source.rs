//! Source descriptors: static, per-source retrieval configuration.
//!
//! Each [`SourceDescriptor`] names one external index and carries a
//! [`SourceStrategy`] tagged by retrieval kind. Adapters dispatch on that
//! tag; the extraction rules for each kind are fixed structs rather than
//! free-form maps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;

/// Placeholder replaced with the percent-encoded query in URL templates.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Static configuration for one external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Stable identifier, referenced by [`ResultItem::source_id`](crate::ResultItem).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Inactive sources are never queried.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Trust weight in `[0, 1]` used by the ranker.
    pub reliability: f64,
    /// How the source is fetched and parsed.
    pub retrieval: SourceStrategy,
}

fn default_active() -> bool {
    true
}

/// Retrieval strategy, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Structured JSON API.
    Api(ApiRules),
    /// Server-rendered HTML listing page.
    Html(ListingRules),
    /// HTML listing that only exists after client-side rendering.
    Script(ListingRules),
}

/// Coarse retrieval kind, as shown in the sites listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Api,
    Html,
    Script,
}

impl SourceKind {
    /// Label used by the sites listing: `"API"`, `"HTML"` or `"JS"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Html => "HTML",
            Self::Script => "JS",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Request rules for a JSON API source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRules {
    /// Endpoint URL, without query string.
    pub endpoint: String,
    /// Name of the query-string parameter carrying the search text.
    pub query_param: String,
    /// Fixed extra query-string parameters.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// Request and extraction rules for an HTML listing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRules {
    /// Search URL template containing [`QUERY_PLACEHOLDER`].
    pub search_url: String,
    /// CSS selectors for the listing's fields.
    pub selectors: SelectorRules,
}

/// CSS selectors locating each canonical field inside a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorRules {
    /// Selects each repeating result node.
    pub results: String,
    /// Selects the title element inside a result node. Required.
    pub title: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub seeds: Option<String>,
    #[serde(default)]
    pub leeches: Option<String>,
}

impl SourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        match self.retrieval {
            SourceStrategy::Api(_) => SourceKind::Api,
            SourceStrategy::Html(_) => SourceKind::Html,
            SourceStrategy::Script(_) => SourceKind::Script,
        }
    }

    /// `"API"`, `"HTML"` or `"JS"`, as shown in the sites listing.
    pub fn kind_label(&self) -> &'static str {
        self.kind().label()
    }

    /// Checks the descriptor for obviously broken values.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.id.trim().is_empty() {
            return Err(SearchError::Config("source id must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.reliability) {
            return Err(SearchError::Config(format!(
                "source {}: reliability must be within [0, 1]",
                self.id
            )));
        }
        match &self.retrieval {
            SourceStrategy::Api(rules) => {
                Url::parse(&rules.endpoint).map_err(|e| {
                    SearchError::Config(format!("source {}: invalid endpoint: {e}", self.id))
                })?;
            }
            SourceStrategy::Html(rules) | SourceStrategy::Script(rules) => {
                if !rules.search_url.contains(QUERY_PLACEHOLDER) {
                    return Err(SearchError::Config(format!(
                        "source {}: search_url must contain {QUERY_PLACEHOLDER}",
                        self.id
                    )));
                }
                Url::parse(&rules.search_url.replace(QUERY_PLACEHOLDER, "q")).map_err(|e| {
                    SearchError::Config(format!("source {}: invalid search_url: {e}", self.id))
                })?;
            }
        }
        Ok(())
    }
}

impl ListingRules {
    /// Expand the URL template with the percent-encoded query.
    pub fn url_for(&self, query: &str) -> String {
        self.search_url
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }
}

/// Looks up a source's reliability, falling back to 0.5 for unknown ids.
pub fn reliability_of(sources: &[SourceDescriptor], source_id: &str) -> f64 {
    sources
        .iter()
        .find(|s| s.id == source_id)
        .map(|s| s.reliability)
        .unwrap_or(0.5)
}

fn listing(search_url: &str, selectors: [&str; 5]) -> ListingRules {
    let [results, title, size, seeds, leeches] = selectors;
    ListingRules {
        search_url: search_url.to_owned(),
        selectors: SelectorRules {
            results: results.to_owned(),
            title: title.to_owned(),
            size: Some(size.to_owned()),
            seeds: Some(seeds.to_owned()),
            leeches: Some(leeches.to_owned()),
        },
    }
}

/// The built-in source catalog.
pub fn builtin_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            id: "1337x".into(),
            name: "1337x".into(),
            active: true,
            reliability: 0.95,
            retrieval: SourceStrategy::Html(listing(
                "https://1337x.to/search/{query}/1/",
                [
                    "tbody tr",
                    ".name a:last-child",
                    ".size",
                    ".seeds",
                    ".leeches",
                ],
            )),
        },
        SourceDescriptor {
            id: "yts".into(),
            name: "YTS".into(),
            active: true,
            reliability: 0.90,
            retrieval: SourceStrategy::Api(ApiRules {
                endpoint: "https://yts.mx/api/v2/list_movies.json".into(),
                query_param: "query_term".into(),
                params: BTreeMap::from([
                    ("limit".to_owned(), "20".to_owned()),
                    ("sort_by".to_owned(), "seeds".to_owned()),
                ]),
            }),
        },
        SourceDescriptor {
            id: "rarbg".into(),
            name: "RARBG".into(),
            active: true,
            reliability: 0.85,
            retrieval: SourceStrategy::Html(listing(
                "https://rarbgprx.org/torrents.php?search={query}",
                [
                    ".lista2 tr",
                    "td:nth-child(2) a",
                    "td:nth-child(4)",
                    "td:nth-child(5)",
                    "td:nth-child(6)",
                ],
            )),
        },
        SourceDescriptor {
            id: "torrentgalaxy".into(),
            name: "TorrentGalaxy".into(),
            active: true,
            reliability: 0.87,
            retrieval: SourceStrategy::Script(listing(
                "https://torrentgalaxy.to/torrents.php?search={query}",
                [
                    "#tor tr",
                    ".txlight a",
                    "span.badge-secondary",
                    "font[color='green']",
                    "font[color='#ff0000']",
                ],
            )),
        },
        SourceDescriptor {
            id: "limetorrents".into(),
            name: "LimeTorrents".into(),
            active: true,
            reliability: 0.82,
            retrieval: SourceStrategy::Html(listing(
                "https://www.limetorrents.lol/search/all/{query}/",
                [
                    ".table2 tr",
                    ".tt-name a",
                    ".tdnormal:nth-child(3)",
                    ".tdseed",
                    ".tdleech",
                ],
            )),
        },
    ]
}
