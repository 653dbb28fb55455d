//! Static-HTML listing adapter and the shared node-extraction logic.
//!
//! Fetches a templated search URL, then walks the repeating result nodes
//! selected by the source's [`SelectorRules`]. The same extraction runs on
//! markup produced by the script-rendered adapter.

use scraper::{ElementRef, Html, Selector};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::{ListingRules, SelectorRules, SourceDescriptor};
use crate::types::{ListingRecord, RawRecord};

/// Adapter for [`SourceStrategy::Html`](crate::source::SourceStrategy::Html) sources.
pub struct HtmlAdapter {
    config: SearchConfig,
}

impl HtmlAdapter {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub async fn fetch(
        &self,
        query: &str,
        source: &SourceDescriptor,
        rules: &ListingRules,
    ) -> Result<Vec<RawRecord>, SearchError> {
        tracing::trace!(query, source = %source.id, "HTML source request");

        let client = http::build_client(&self.config)?;

        let response = client
            .get(rules.url_for(query))
            .header("Accept", http::ACCEPT_HTML)
            .header("Accept-Language", http::ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("{} request failed: {e}", source.id)))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("{} HTTP error: {e}", source.id)))?;

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("{} response read failed: {e}", source.id)))?;

        tracing::trace!(source = %source.id, bytes = html.len(), "HTML response received");

        parse_listing(
            &html,
            &rules.selectors,
            &source.id,
            self.config.max_rows_per_source,
        )
    }
}

struct CompiledSelectors {
    results: Selector,
    title: Selector,
    size: Option<Selector>,
    seeds: Option<Selector>,
    leeches: Option<Selector>,
    magnet: Selector,
}

fn compile(css: &str, field: &str) -> Result<Selector, SearchError> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("invalid {field} selector {css:?}: {e:?}")))
}

fn compile_optional(css: Option<&str>, field: &str) -> Result<Option<Selector>, SearchError> {
    css.filter(|c| !c.trim().is_empty())
        .map(|c| compile(c, field))
        .transpose()
}

impl CompiledSelectors {
    fn new(rules: &SelectorRules) -> Result<Self, SearchError> {
        Ok(Self {
            results: compile(&rules.results, "results")?,
            title: compile(&rules.title, "title")?,
            size: compile_optional(rules.size.as_deref(), "size")?,
            seeds: compile_optional(rules.seeds.as_deref(), "seeds")?,
            leeches: compile_optional(rules.leeches.as_deref(), "leeches")?,
            magnet: compile(r#"a[href^="magnet:"]"#, "magnet")?,
        })
    }
}

/// Parse a listing page into raw records.
///
/// Reads at most `max_rows` result nodes. Nodes without a non-empty title
/// are skipped; missing size/seeds/leeches fall back to `None`/0/0.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] only when a selector itself is invalid.
pub fn parse_listing(
    html: &str,
    rules: &SelectorRules,
    source_id: &str,
    max_rows: usize,
) -> Result<Vec<RawRecord>, SearchError> {
    let selectors = CompiledSelectors::new(rules)?;
    let document = Html::parse_document(html);

    let mut records = Vec::new();
    for (row_index, row) in document.select(&selectors.results).take(max_rows).enumerate() {
        match extract_row(row, &selectors) {
            Some(record) => records.push(RawRecord::Listing(record)),
            None => tracing::debug!(source = source_id, row_index, "skipping row without title"),
        }
    }

    tracing::debug!(source = source_id, count = records.len(), "listing rows parsed");
    Ok(records)
}

fn extract_row(row: ElementRef<'_>, selectors: &CompiledSelectors) -> Option<ListingRecord> {
    let title = row
        .select(&selectors.title)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())?;

    let size = selectors
        .size
        .as_ref()
        .and_then(|sel| select_text(row, sel))
        .filter(|s| !s.is_empty());
    let seeds = selectors
        .seeds
        .as_ref()
        .and_then(|sel| select_text(row, sel))
        .map(|t| first_number(&t))
        .unwrap_or(0);
    let leeches = selectors
        .leeches
        .as_ref()
        .and_then(|sel| select_text(row, sel))
        .map(|t| first_number(&t))
        .unwrap_or(0);
    let magnet_link = row
        .select(&selectors.magnet)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_owned);

    Some(ListingRecord {
        title,
        size,
        seeds,
        leeches,
        magnet_link,
    })
}

fn select_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector).next().map(element_text)
}

/// Element text with whitespace runs collapsed and ends trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first run of ASCII digits in `text`, or 0 if there is none.
pub fn first_number(text: &str) -> u64 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{builtin_sources, SourceStrategy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<table class="table-list"><tbody>
  <tr>
    <td class="coll-1 name"><a href="/sub/1/">icon</a><a href="/torrent/1/inception/">Inception 2010 1080p BluRay x264</a></td>
    <td class="coll-2 seeds">1,532</td>
    <td class="coll-3 leeches">87</td>
    <td class="coll-4 size">2.1 GB</td>
    <td><a href="magnet:?xt=urn:btih:aaa">magnet</a></td>
  </tr>
  <tr>
    <td class="coll-1 name"><a href="/torrent/2/">  Inception   (2010)   720p  </a></td>
    <td class="coll-2 seeds">n/a</td>
    <td class="coll-3 leeches"></td>
  </tr>
  <tr>
    <td class="coll-1 name"></td>
    <td class="coll-2 seeds">10</td>
  </tr>
  <tr>
    <td class="coll-1 name"><a href="/torrent/4/">Inception Extras</a></td>
    <td class="coll-2 seeds">4</td>
    <td class="coll-3 leeches">1</td>
  </tr>
</tbody></table>
</body></html>"#;

    fn rules() -> SelectorRules {
        SelectorRules {
            results: "tbody tr".into(),
            title: ".name a:last-child".into(),
            size: Some(".size".into()),
            seeds: Some("td.seeds".into()),
            leeches: Some(".leeches".into()),
        }
    }

    fn listing(record: &RawRecord) -> &ListingRecord {
        match record {
            RawRecord::Listing(r) => r,
            other => panic!("expected listing record, got {other:?}"),
        }
    }

    #[test]
    fn extracts_fields_and_skips_rows_without_title() {
        let records = parse_listing(LISTING_HTML, &rules(), "1337x", 20).expect("should parse");
        assert_eq!(records.len(), 3);

        let first = listing(&records[0]);
        assert_eq!(first.title, "Inception 2010 1080p BluRay x264");
        assert_eq!(first.seeds, 1);
        assert_eq!(first.leeches, 87);
        assert_eq!(first.size.as_deref(), Some("2.1 GB"));
        assert_eq!(first.magnet_link.as_deref(), Some("magnet:?xt=urn:btih:aaa"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let records = parse_listing(LISTING_HTML, &rules(), "1337x", 20).expect("should parse");
        let second = listing(&records[1]);
        assert_eq!(second.title, "Inception (2010) 720p");
        assert_eq!(second.seeds, 0);
        assert_eq!(second.leeches, 0);
        assert!(second.size.is_none());
        assert!(second.magnet_link.is_none());
    }

    #[test]
    fn respects_max_rows() {
        let records = parse_listing(LISTING_HTML, &rules(), "1337x", 1).expect("should parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn invalid_selector_is_parse_error() {
        let mut bad = rules();
        bad.title = "td[[".into();
        let err = parse_listing(LISTING_HTML, &bad, "1337x", 20).unwrap_err();
        assert!(err.to_string().contains("title selector"));
    }

    #[test]
    fn empty_document_returns_empty() {
        let records =
            parse_listing("<html><body></body></html>", &rules(), "1337x", 20).expect("parse");
        assert!(records.is_empty());
    }

    #[test]
    fn first_number_takes_first_digit_run() {
        assert_eq!(first_number("1,532"), 1);
        assert_eq!(first_number("Seeds: 42 (7 new)"), 42);
        assert_eq!(first_number("none"), 0);
        assert_eq!(first_number(""), 0);
    }

    #[tokio::test]
    async fn fetch_expands_template_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/the%20matrix/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_HTML))
            .expect(1)
            .mount(&server)
            .await;

        let mut source = builtin_sources().remove(0);
        let rules = ListingRules {
            search_url: format!("{}/search/{{query}}/1/", server.uri()),
            selectors: rules(),
        };
        source.retrieval = SourceStrategy::Html(rules.clone());

        let adapter = HtmlAdapter::new(SearchConfig::default());
        let records = adapter
            .fetch("the matrix", &source, &rules)
            .await
            .expect("fetch should succeed");
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = builtin_sources().remove(0);
        let rules = ListingRules {
            search_url: format!("{}/search/{{query}}/1/", server.uri()),
            selectors: rules(),
        };
        let adapter = HtmlAdapter::new(SearchConfig::default());
        let err = adapter.fetch("x", &source, &rules).await.unwrap_err();
        assert!(matches!(err, SearchError::Http(_)));
    }
}
