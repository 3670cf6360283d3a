//! Scrape run coordination
//!
//! Wires the walker, scheduler, fetcher, and cache together and drives a
//! run through its phases: Idle -> Listing -> Scheduling -> Done. No phase
//! is re-entered, and a run that completes always reaches Done carrying both
//! successes and failures; partial failure is a reportable outcome, not a
//! run-level error.

use crate::cache::RequestCache;
use crate::config::Config;
use crate::scraper::fetcher::{build_http_client, TopicFetcher};
use crate::scraper::scheduler::{BatchScheduler, RunOutput};
use crate::scraper::walker::ListingWalker;
use crate::HarvestError;
use std::sync::Arc;

/// Phase of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Listing,
    Scheduling,
    Done,
}

/// Main scrape coordinator
pub struct Coordinator {
    config: Config,
    walker: ListingWalker,
    scheduler: BatchScheduler,
    phase: RunPhase,
}

impl Coordinator {
    /// Creates a new coordinator from a validated configuration
    ///
    /// Builds the HTTP client and the shared request cache, then constructs
    /// the walker and scheduler around them.
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.scrape).map_err(|source| HarvestError::Http {
            url: config.forum.base_url.clone(),
            source,
        })?;

        let cache = Arc::new(RequestCache::new(&config.cache));
        if cache.is_enabled() {
            tracing::info!("Request cache enabled at {}", config.cache.directory);
        } else {
            tracing::info!("Request cache disabled, every request hits the network");
        }

        let walker = ListingWalker::new(
            client.clone(),
            Arc::clone(&cache),
            config.forum.base_url.clone(),
            config.scrape.page_size,
        );

        let fetcher = Arc::new(TopicFetcher::new(
            client,
            cache,
            config.forum.base_url.clone(),
            &config.scrape,
        ));
        let scheduler = BatchScheduler::new(fetcher, &config.scrape);

        Ok(Self {
            config,
            walker,
            scheduler,
            phase: RunPhase::Idle,
        })
    }

    /// Current run phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs a full scrape: listing walk, then batch scheduling
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutput)` - The run completed; failures, if any, are inside
    /// * `Err(HarvestError::UnknownCategory)` - The configured category has
    ///   no known mapping (the only error that aborts a run)
    pub async fn run(&mut self) -> Result<RunOutput, HarvestError> {
        let category = self.config.forum.category.clone();
        tracing::info!("Starting scrape run for category '{}'", category);

        self.set_phase(RunPhase::Listing);
        let slugs = self
            .walker
            .list_topics(&category, self.config.scrape.page_count)
            .await?;
        tracing::info!(
            "Listing walk found {} topics across {} pages",
            slugs.len(),
            self.config.scrape.page_count
        );

        self.set_phase(RunPhase::Scheduling);
        let output = self.scheduler.run(&slugs).await;

        self.set_phase(RunPhase::Done);
        report(&output);
        Ok(output)
    }

    /// Runs a retry pass over a previously recorded failure set
    ///
    /// Skips the listing walk entirely and feeds the given slugs straight to
    /// the scheduler.
    pub async fn refetch(&mut self, slugs: &[String]) -> RunOutput {
        tracing::info!("Refetching {} previously failed topics", slugs.len());

        self.set_phase(RunPhase::Scheduling);
        let output = self.scheduler.run(slugs).await;

        self.set_phase(RunPhase::Done);
        report(&output);
        output
    }

    fn set_phase(&mut self, phase: RunPhase) {
        tracing::debug!("Run phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Logs the end-of-run report
fn report(output: &RunOutput) {
    tracing::info!(
        "Run complete: {} succeeded, {} failed",
        output.successes.len(),
        output.failures.len()
    );
    for slug in &output.failures {
        tracing::info!("  failed: {}", slug);
    }
}
