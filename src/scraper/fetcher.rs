//! Rate-limited topic fetcher
//!
//! This module handles per-topic HTTP fetching, including:
//! - Building the shared HTTP client
//! - Topic-detail requests through the request cache
//! - Retry logic with a fixed delay between attempts
//! - Converting every failure mode into a reportable outcome

use crate::cache::RequestCache;
use crate::config::ScrapeConfig;
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of fetching a single topic
///
/// Fetch errors never escape the fetcher; retry exhaustion is folded into
/// the `Failure` variant so one bad topic can never abort a run.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Topic fetched and parsed successfully
    Success {
        /// The topic slug
        slug: String,
        /// Full discussion payload, passed through unchanged
        payload: serde_json::Value,
    },

    /// All attempts exhausted
    Failure {
        /// The topic slug, kept for a later retry pass
        slug: String,
        /// Description of the last error seen
        error: String,
    },
}

impl FetchOutcome {
    /// The slug this outcome belongs to
    pub fn slug(&self) -> &str {
        match self {
            FetchOutcome::Success { slug, .. } => slug,
            FetchOutcome::Failure { slug, .. } => slug,
        }
    }
}

/// Builds the HTTP client shared by all fetches in a run
///
/// # Arguments
///
/// * `config` - The scrape configuration (timeout and connection bounds)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ScrapeConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(config.max_connections)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches topic-detail payloads with bounded retries
pub struct TopicFetcher {
    client: Client,
    cache: Arc<RequestCache>,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl TopicFetcher {
    /// Creates a new fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - The shared HTTP client
    /// * `cache` - The shared request cache
    /// * `base_url` - Base URL of the Discourse instance
    /// * `config` - Retry budget and delay settings
    pub fn new(
        client: Client,
        cache: Arc<RequestCache>,
        base_url: String,
        config: &ScrapeConfig,
    ) -> Self {
        Self {
            client,
            cache,
            base_url,
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }

    /// Fetches the full discussion payload for one topic
    ///
    /// Makes up to `max_retries` attempts, sleeping `retry_delay` between
    /// them. The sleep is cooperative and never blocks other in-flight
    /// fetches. A body that is not valid JSON counts as a failed attempt,
    /// same as any network or status error.
    pub async fn fetch_topic(&self, slug: &str) -> FetchOutcome {
        let url = format!("{}/t/{}.json", self.base_url, slug);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match self.attempt(&url).await {
                Ok(payload) => {
                    tracing::debug!("Fetched {} (attempt {})", slug, attempt);
                    return FetchOutcome::Success {
                        slug: slug.to_string(),
                        payload,
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.max_retries {
                        tracing::debug!(
                            "Attempt {}/{} failed for {}: {}",
                            attempt,
                            self.max_retries,
                            slug,
                            last_error
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        tracing::warn!(
            "All {} attempts failed for {}: {}",
            self.max_retries,
            slug,
            last_error
        );
        FetchOutcome::Failure {
            slug: slug.to_string(),
            error: last_error,
        }
    }

    /// A single fetch attempt through the cache
    async fn attempt(&self, url: &str) -> Result<serde_json::Value, HarvestError> {
        let body = self.cache.get_or_fetch(&self.client, url, &[]).await?;
        serde_json::from_str(&body).map_err(|source| HarvestError::Json {
            url: url.to_string(),
            source,
        })
    }
}
