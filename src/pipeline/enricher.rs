use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::backend::{
    RetryError, RetryPolicy, build_http_client, check_response_status, decode_json,
    handle_http_error,
};
use crate::error::TransportError;
use crate::model::{Enrichment, MetadataInfo};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const TMDB_TIMEOUT: Duration = Duration::from_secs(10);

/// Looks up poster and release year for a title.
///
/// Implementations are total: every failure is absorbed into
/// `Enrichment::NotFound` and only logged.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn enrich(&self, title: &str) -> Enrichment;
}

/// TMDB movie search, taking the first hit as the match.
///
/// Only one search per title; no disambiguation by year or language. A
/// single attempt by default: a slow lookup just means no poster.
pub struct TmdbEnricher {
    api_key: Option<String>,
    base_url: String,
    image_base_url: String,
    retry_policy: RetryPolicy,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    poster_path: Option<String>,
    release_date: Option<String>,
}

impl TmdbEnricher {
    /// Without an API key every lookup returns `NotFound` without touching the network.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: TMDB_BASE_URL.to_string(),
            image_base_url: TMDB_IMAGE_BASE_URL.to_string(),
            retry_policy: RetryPolicy::no_retry(),
            client: build_http_client(Some(TMDB_TIMEOUT)),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn image_base_url(mut self, image_base_url: impl Into<String>) -> Self {
        self.image_base_url = image_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(Some(timeout));
        self
    }

    /// Opt in to retrying transient lookup failures.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    async fn search(&self, api_key: &str, title: &str) -> Result<SearchResponse, TransportError> {
        let url = format!("{}/search/movie", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key), ("query", title)])
            .send()
            .await
            .map_err(|e| handle_http_error(e, "TMDB"))?;

        let response = check_response_status(response, "TMDB").await?;
        decode_json(response, "TMDB").await
    }

    fn poster_url(&self, poster_path: &str) -> String {
        if poster_path.starts_with('/') {
            format!("{}{}", self.image_base_url, poster_path)
        } else {
            format!("{}/{}", self.image_base_url, poster_path)
        }
    }
}

#[async_trait]
impl MetadataLookup for TmdbEnricher {
    #[instrument(name = "tmdb_enrich", skip(self))]
    async fn enrich(&self, title: &str) -> Enrichment {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("TMDB API key not configured, skipping lookup");
            return Enrichment::NotFound;
        };

        let response = match self
            .retry_policy
            .run(
                "tmdb_search",
                || self.search(api_key, title),
                TransportError::is_transient,
            )
            .await
        {
            Ok(response) => response,
            Err(RetryError::Exhausted { last_error, .. }) => {
                warn!(error = %last_error, "Metadata lookup failed");
                return Enrichment::NotFound;
            }
            Err(RetryError::Permanent { error, .. }) => {
                warn!(error = %error, "Metadata lookup failed");
                return Enrichment::NotFound;
            }
        };

        let Some(best) = response.results.into_iter().next() else {
            debug!("No search results");
            return Enrichment::NotFound;
        };

        let Some(poster_path) = best.poster_path.filter(|p| !p.trim().is_empty()) else {
            debug!("Best match has no poster");
            return Enrichment::NotFound;
        };

        let info = MetadataInfo {
            poster_url: self.poster_url(poster_path.trim()),
            year: best.release_date.as_deref().and_then(release_year),
        };
        debug!(poster_url = %info.poster_url, year = ?info.year, "Found metadata");
        Enrichment::Found(info)
    }
}

/// First four characters of a release date, if they are a year.
fn release_year(release_date: &str) -> Option<String> {
    release_date
        .get(..4)
        .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}
