//! Paginated client for the upstream Rick and Morty API
//!
//! Walks a collection endpoint page by page, following `info.next` until the
//! upstream reports no further page. A failed page stops the walk but keeps
//! every record gathered before it.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::RawRecord;

/// Base URL of the public Rick and Morty API
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Upper bound on pages walked before pagination is considered non-terminating
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Errors that stop pagination early
///
/// Each of these is reported next to the records already fetched; none of
/// them discards earlier pages.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a status other than 200
    #[error("Failed to fetch data from {url}: {status}")]
    Status { status: StatusCode, url: String },

    /// More pages than allowed were followed
    #[error("pagination did not terminate after {max_pages} pages (next: {url})")]
    PaginationLimit { max_pages: usize, url: String },

    /// HTTP request failed before a status was available, or the body could not be read
    #[error("HTTP request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Page body was not a valid page document
    #[error("Failed to parse page from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One page of an upstream collection
#[derive(Debug, Deserialize)]
struct Page {
    results: Vec<RawRecord>,
    #[serde(default)]
    info: PageInfo,
}

/// Pagination metadata of a page
#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    #[serde(default)]
    next: Option<String>,
}

/// Records gathered by a full walk, plus the error that cut it short, if any
#[derive(Debug)]
pub struct FetchOutcome {
    /// Records in page order, then within-page order
    pub records: Vec<RawRecord>,
    /// Set when pagination stopped before the last page
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    /// True when every page was fetched
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Client for walking paginated upstream collections
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    /// Page ceiling guarding against cyclic `next` links
    max_pages: usize,
}

impl UpstreamClient {
    /// Creates a client for the public API
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client for a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Replaces the HTTP client (e.g. one configured with a timeout)
    pub fn with_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Sets the page ceiling
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Base URL the client was configured with, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the first page of `endpoint`
    pub fn first_page_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Fetches every page of `endpoint`
    ///
    /// # Behavior
    /// - Starts at `<base>/<endpoint>` and follows `info.next`
    /// - A missing, null, or empty `next` ends the walk
    /// - A non-200 status, transport error, or malformed page stops the walk
    ///   and is returned in `FetchOutcome::error` with the records so far
    /// - Following more than `max_pages` pages stops with `PaginationLimit`
    pub async fn fetch_all(&self, endpoint: &str) -> FetchOutcome {
        let mut records = Vec::new();
        let mut next = Some(self.first_page_url(endpoint));
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            if pages >= self.max_pages {
                let error = FetchError::PaginationLimit {
                    max_pages: self.max_pages,
                    url,
                };
                warn!(records = records.len(), %error, "Stopping pagination");
                return FetchOutcome {
                    records,
                    error: Some(error),
                };
            }

            match self.fetch_page(&url).await {
                Ok(page) => {
                    pages += 1;
                    debug!(%url, count = page.results.len(), "Fetched page");
                    records.extend(page.results);
                    next = page.info.next.filter(|n| !n.is_empty());
                }
                Err(error) => {
                    warn!(records = records.len(), %error, "Stopping pagination");
                    return FetchOutcome {
                        records,
                        error: Some(error),
                    };
                }
            }
        }

        FetchOutcome {
            records,
            error: None,
        }
    }

    /// Fetches and decodes a single page
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.http_client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let text = response.text().await.map_err(transport)?;
        serde_json::from_str(&text).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}
