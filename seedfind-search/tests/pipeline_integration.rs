//! Integration tests for the retrieve → normalise → rank pipeline.
//!
//! Sources are served by local wiremock servers, so no test here touches
//! the network. Live index tests are marked `#[ignore]`.

use std::collections::BTreeMap;
use std::time::Duration;

use seedfind_search::orchestrator::{apply_quality_floor, dedup_key};
use seedfind_search::source::{ApiRules, ListingRules, SelectorRules};
use seedfind_search::types::{ContentType, Quality, ResultItem};
use seedfind_search::{
    rank, Adapters, Orchestrator, RankingMode, SearchConfig, SourceDescriptor, SourceStrategy,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item(title: &str, source: &str, seeds: u64) -> ResultItem {
    ResultItem {
        title: title.to_string(),
        size: "1.4 GB".to_string(),
        seeds,
        leeches: 0,
        source_id: source.to_string(),
        content_type: ContentType::Movie,
        quality: Quality::Unknown,
        magnet_link: None,
        download_url: None,
        relevance_score: 0.0,
        retrieved_at_epoch_seconds: 0,
    }
}

fn listing_page(rows: &[(&str, u64)]) -> String {
    let body: String = rows
        .iter()
        .map(|(title, seeds)| {
            format!(
                r#"<tr><td class="name"><a href="/t">{title}</a></td><td class="seeds">{seeds}</td><td class="leeches">2</td><td class="size">1.2 GB</td><td><a href="magnet:?xt=urn:btih:{seeds}">m</a></td></tr>"#
            )
        })
        .collect();
    format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

fn html_source(id: &str, base: &str, reliability: f64) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        name: id.to_uppercase(),
        active: true,
        reliability,
        retrieval: SourceStrategy::Html(ListingRules {
            search_url: format!("{base}/{id}/search/{{query}}"),
            selectors: SelectorRules {
                results: "tbody tr".into(),
                title: ".name a".into(),
                size: Some(".size".into()),
                seeds: Some(".seeds".into()),
                leeches: Some(".leeches".into()),
            },
        }),
    }
}

fn api_source(base: &str) -> SourceDescriptor {
    SourceDescriptor {
        id: "yts".into(),
        name: "YTS".into(),
        active: true,
        reliability: 0.9,
        retrieval: SourceStrategy::Api(ApiRules {
            endpoint: format!("{base}/api/v2/list_movies.json"),
            query_param: "query_term".into(),
            params: BTreeMap::from([("limit".to_string(), "20".to_string())]),
        }),
    }
}

fn fast_config() -> SearchConfig {
    SearchConfig {
        request_delay_ms: (0, 0),
        timeout_seconds: 1,
        ..Default::default()
    }
}

#[test]
fn duplicate_titles_collapse_to_first_seen() {
    let items = vec![
        item("Inception 1080p BluRay", "1337x", 500),
        item("inception 1080p bluray", "rarbg", 10),
    ];
    let sources = seedfind_search::builtin_sources();
    for mode in [RankingMode::Scored, RankingMode::Seeds] {
        let out = rank(items.clone(), "inception", &sources, mode, 50);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].seeds, 500);
        assert_eq!(out[0].source_id, "1337x");
    }
}

#[test]
fn no_two_results_share_a_dedup_key() {
    let titles = [
        "Dune Part Two 2160p",
        "dune part two 2160p",
        "Dune  Part  Two  2160p",
        "Dune Part One 1080p",
        "DUNE PART ONE 1080P",
    ];
    let items: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(n, t)| item(t, "1337x", 100 + n as u64))
        .collect();
    let out = rank(items, "dune", &seedfind_search::builtin_sources(), RankingMode::Scored, 50);
    let mut keys: Vec<_> = out.iter().map(|i| dedup_key(&i.title)).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), out.len());
    assert_eq!(out.len(), 2);
}

#[test]
fn unscored_fallback_orders_by_seeds() {
    let items: Vec<_> = [5u64, 50, 1, 999, 20]
        .iter()
        .enumerate()
        .map(|(n, s)| item(&format!("Unscored release {n}"), "limetorrents", *s))
        .collect();
    let out = rank(items, "release", &seedfind_search::builtin_sources(), RankingMode::Seeds, 50);
    let seeds: Vec<_> = out.iter().map(|i| i.seeds).collect();
    assert_eq!(seeds, [999, 50, 20, 5, 1]);
}

#[test]
fn scoring_is_reproducible_and_bounded() {
    let sources = seedfind_search::builtin_sources();
    let items: Vec<_> = (0..40u64)
        .map(|n| {
            let source = &sources[(n % 5) as usize].id;
            item(&format!("Series S01E{n:02} 720p WEB-DL"), source, n * 7)
        })
        .collect();

    let first = rank(items.clone(), "series 720p", &sources, RankingMode::Scored, 50);
    let second = rank(items, "series 720p", &sources, RankingMode::Scored, 50);
    assert_eq!(first, second);
    assert!(first.iter().all(|i| (0.0..=1.0).contains(&i.relevance_score)));
}

#[test]
fn quality_floor_is_idempotent_on_ranked_output() {
    let items: Vec<_> = (0..20u64)
        .map(|n| item(&format!("Random upload {n}"), "nowhere", n))
        .collect();
    let ranked = rank(items, "unrelated words", &[], RankingMode::Scored, 50);
    assert!(ranked.iter().all(|i| i.seeds > 10 || i.relevance_score > 0.3));
    assert_eq!(apply_quality_floor(ranked.clone()), ranked);
}

#[tokio::test]
async fn timed_out_source_does_not_block_the_other_four() {
    let server = MockServer::start().await;

    for (id, rows) in [
        ("alpha", vec![("Inception 2010 1080p BluRay", 700u64)]),
        ("bravo", vec![("Inception 2010 720p", 300)]),
        ("charlie", vec![("Inception 2010 2160p", 150)]),
        ("delta", vec![("Inception 2010 HDTV", 60)]),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/{id}/search/inception")))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&rows)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v2/list_movies.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"ok","data":{"movies":[]}}"#)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let base = server.uri();
    let sources = vec![
        html_source("alpha", &base, 0.95),
        api_source(&base),
        html_source("bravo", &base, 0.85),
        html_source("charlie", &base, 0.87),
        html_source("delta", &base, 0.82),
    ];

    let config = fast_config();
    let orchestrator = Orchestrator::new(Adapters::new(&config).expect("adapters"), config.clone());
    let retrieval = orchestrator.retrieve("inception", &sources).await;

    assert_eq!(retrieval.failures.len(), 1);
    assert_eq!(retrieval.failures[0].source_id, "yts");
    assert_eq!(retrieval.batches.len(), 4);

    let items = retrieval.into_items(1_700_000_000);
    let ranked = rank(items, "inception", &sources, RankingMode::Scored, config.max_results);
    let mut from: Vec<_> = ranked.iter().map(|i| i.source_id.as_str()).collect();
    from.sort_unstable();
    assert_eq!(from, ["alpha", "bravo", "charlie", "delta"]);
    assert_eq!(ranked[0].title, "Inception 2010 2160p");
    assert_eq!(ranked[1].title, "Inception 2010 1080p BluRay");
    assert!(ranked.iter().all(|i| i.magnet_link.is_some()));
}

#[tokio::test]
async fn inactive_and_capped_sources_are_not_queried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alpha/search/heat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[("Heat 1995 BluRay", 80)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bravo/search/heat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[("Heat 1995 DVDRip", 40)])),
        )
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/charlie/search/heat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[("Heat 1995 720p", 20)])),
        )
        .expect(0)
        .mount(&server)
        .await;

    let base = server.uri();
    let mut sources = vec![
        html_source("bravo", &base, 0.8),
        html_source("alpha", &base, 0.8),
        html_source("charlie", &base, 0.8),
    ];
    sources[0].active = false;

    let selected = seedfind_search::select_sources(&sources, 1);
    let config = fast_config();
    let orchestrator = Orchestrator::new(Adapters::new(&config).expect("adapters"), config);
    let retrieval = orchestrator.retrieve("heat", &selected).await;
    assert_eq!(retrieval.record_count(), 1);
}

#[tokio::test]
#[ignore] // requires network access
async fn live_builtin_sources() {
    let results = seedfind_search::search("big buck bunny", &SearchConfig::default())
        .await
        .expect("search");
    println!("{} results", results.len());
}
