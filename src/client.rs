//! Article Search API client with pagination and exponential backoff.
//!
//! This module is the pipeline's data source: it pulls raw article documents
//! from the New York Times Article Search API, page by page, and hands them
//! to the normalization core undecoded beyond JSON parsing.
//!
//! # Pagination
//!
//! The API serves 10 results per page and refuses page indexes past 100, so
//! a request for N articles fetches `ceil(N / 10)` pages, capped at 100.
//! Fetching stops early when a page comes back empty or the requested count
//! is reached. The public tier is rate limited, so the client sleeps 12
//! seconds between page requests.
//!
//! # Retry Strategy
//!
//! Each page request retries transient failures with exponential backoff:
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{rng, Rng};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Default Article Search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com/svc/search/v2/articlesearch.json";

/// Results per page, fixed by the API.
const PAGE_SIZE: usize = 10;
/// Highest page index the API will serve.
const MAX_PAGES: usize = 100;
/// Pause between page requests (public-tier rate limit).
const PAGE_DELAY: StdDuration = StdDuration::from_secs(12);

/// Maximum number of retry attempts before giving up on a page.
const MAX_RETRIES: usize = 5;
/// Initial delay between retries (doubles with each attempt).
const BASE_DELAY: StdDuration = StdDuration::from_secs(1);
/// Maximum delay cap to prevent excessive waiting.
const MAX_DELAY: StdDuration = StdDuration::from_secs(30);

/// Top-level Article Search response envelope. Only the document list is
/// decoded; the documents themselves stay as raw JSON values.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    docs: Vec<Value>,
}

/// Number of pages needed to cover `max_results`, capped at the API limit.
fn pages_needed(max_results: usize) -> usize {
    max_results.div_ceil(PAGE_SIZE).min(MAX_PAGES)
}

/// HTTP client for the Article Search API.
#[derive(Debug)]
pub struct ArticleSearchClient {
    http: Client,
    api_key: String,
    base_url: Url,
}

impl ArticleSearchClient {
    /// Create a client for the given API key.
    ///
    /// `base_url` overrides the production endpoint; `None` uses
    /// [`DEFAULT_BASE_URL`].
    pub fn new(api_key: &str, base_url: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        Ok(Self {
            http: Client::new(),
            api_key: api_key.to_string(),
            base_url,
        })
    }

    /// Search for articles matching `query` within the optional date range.
    ///
    /// Dates are `YYYYMMDD` strings as the API expects. Returns up to
    /// `max_results` raw documents in pagination order, fetching pages
    /// sequentially starting at `start_page`.
    #[instrument(level = "info", skip_all, fields(%query, max_results))]
    pub async fn search_articles(
        &self,
        query: &str,
        begin_date: Option<&str>,
        end_date: Option<&str>,
        max_results: usize,
        start_page: usize,
    ) -> Result<Vec<Value>, Box<dyn Error>> {
        let mut all_articles: Vec<Value> = Vec::new();
        let pages = pages_needed(max_results);
        info!(max_results, pages, "Fetching articles");

        for page in start_page..start_page + pages {
            let docs = self
                .fetch_page_with_backoff(query, begin_date, end_date, page)
                .await?;

            if docs.is_empty() {
                info!(page, "No more articles found");
                break;
            }

            debug!(page, count = docs.len(), "Retrieved page");
            all_articles.extend(docs);

            if all_articles.len() >= max_results {
                all_articles.truncate(max_results);
                break;
            }

            if page + 1 < start_page + pages {
                sleep(PAGE_DELAY).await;
            }
        }

        info!(
            total = all_articles.len(),
            %query,
            "Total articles retrieved"
        );
        Ok(all_articles)
    }

    /// Fetch one page, retrying transient failures with exponential backoff.
    async fn fetch_page_with_backoff(
        &self,
        query: &str,
        begin_date: Option<&str>,
        end_date: Option<&str>,
        page: usize,
    ) -> Result<Vec<Value>, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.fetch_page(query, begin_date, end_date, page).await {
                Ok(docs) => return Ok(docs),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > MAX_RETRIES {
                        error!(
                            page,
                            attempt,
                            max = MAX_RETRIES,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "page fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = BASE_DELAY.saturating_mul(1 << (attempt - 1));
                    if delay > MAX_DELAY {
                        delay = MAX_DELAY;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        page,
                        attempt,
                        max = MAX_RETRIES,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "page fetch failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_page(
        &self,
        query: &str,
        begin_date: Option<&str>,
        end_date: Option<&str>,
        page: usize,
    ) -> Result<Vec<Value>, Box<dyn Error>> {
        let mut params: Vec<(&str, String)> = vec![
            ("api-key", self.api_key.clone()),
            ("q", query.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(begin) = begin_date {
            params.push(("begin_date", begin.to_string()));
        }
        if let Some(end) = end_date {
            params.push(("end_date", end.to_string()));
        }

        let response = self
            .http
            .get(self.base_url.clone())
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.response.docs)
    }
}
