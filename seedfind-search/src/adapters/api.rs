//! JSON API adapter (YTS-style `list_movies` endpoint).
//!
//! Issues a single GET with the query as a parameter and decodes the body.
//! Each movie can carry several torrents (one per quality), and every
//! torrent becomes its own [`ApiRecord`]. Movies and torrents are decoded one
//! at a time, so a malformed entry is skipped without losing its siblings.

use serde::Deserialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::source::{ApiRules, SourceDescriptor};
use crate::types::{ApiRecord, RawRecord};

/// Adapter for [`SourceStrategy::Api`](crate::source::SourceStrategy::Api) sources.
pub struct ApiAdapter {
    config: SearchConfig,
}

#[derive(Debug, Deserialize)]
struct ListMoviesResponse {
    status: String,
    #[serde(default)]
    data: Option<ListMoviesData>,
}

#[derive(Debug, Deserialize)]
struct ListMoviesData {
    /// Absent (not empty) when nothing matched.
    #[serde(default)]
    movies: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Movie {
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    torrents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Torrent {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    seeds: u64,
    #[serde(default)]
    peers: u64,
}

impl ApiAdapter {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub async fn fetch(
        &self,
        query: &str,
        source: &SourceDescriptor,
        rules: &ApiRules,
    ) -> Result<Vec<RawRecord>, SearchError> {
        tracing::trace!(query, source = %source.id, "API source request");

        let client = http::build_client(&self.config)?;

        let mut params: Vec<(&str, &str)> = vec![(rules.query_param.as_str(), query)];
        params.extend(rules.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = client
            .get(&rules.endpoint)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("{} request failed: {e}", source.id)))?
            .error_for_status()
            .map_err(|e| SearchError::Http(format!("{} HTTP error: {e}", source.id)))?;

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("{} response read failed: {e}", source.id)))?;

        let records = parse_list_movies(&body)?;
        tracing::debug!(source = %source.id, count = records.len(), "API records parsed");
        Ok(records)
    }
}

/// Decode a `list_movies` body into one record per torrent variant.
///
/// A body whose `status` is not `"ok"`, or which has no movies, yields an
/// empty list rather than an error.
pub(crate) fn parse_list_movies(body: &str) -> Result<Vec<RawRecord>, SearchError> {
    let parsed: ListMoviesResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("invalid list_movies body: {e}")))?;

    if parsed.status != "ok" {
        tracing::debug!(status = %parsed.status, "API reported non-ok status");
        return Ok(Vec::new());
    }

    let movies = parsed
        .data
        .and_then(|d| d.movies)
        .unwrap_or_default();

    let mut records = Vec::new();
    for value in movies {
        let movie: Movie = match serde_json::from_value(value) {
            Ok(movie) => movie,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed movie");
                continue;
            }
        };
        for value in movie.torrents {
            let torrent: Torrent = match serde_json::from_value(value) {
                Ok(torrent) => torrent,
                Err(e) => {
                    tracing::debug!(movie = %movie.title, error = %e, "skipping malformed torrent");
                    continue;
                }
            };
            let quality_label = torrent.quality.as_deref().unwrap_or("N/A");
            let title = match movie.year {
                Some(year) => format!("{} ({year}) [{quality_label}]", movie.title),
                None => format!("{} [{quality_label}]", movie.title),
            };
            records.push(RawRecord::Api(ApiRecord {
                title,
                size: torrent.size,
                seeds: torrent.seeds,
                leeches: torrent.peers,
                quality: torrent.quality,
                download_url: torrent.url,
            }));
        }
    }
    Ok(records)
}
