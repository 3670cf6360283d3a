//! Core scrape pipeline
//!
//! This module contains the asynchronous fetch pipeline, including:
//! - Topic fetching with retry logic
//! - Batch scheduling and rate limiting
//! - Paginated listing walking
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod scheduler;
mod walker;

pub use coordinator::{Coordinator, RunPhase};
pub use fetcher::{build_http_client, FetchOutcome, TopicFetcher};
pub use scheduler::{BatchScheduler, RunOutput};
pub use walker::{extract_slugs, ListingWalker};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete scrape operation
///
/// This is the main entry point for a scrape. It will:
/// 1. Build the HTTP client and request cache
/// 2. Walk the category's listing pages
/// 3. Schedule and fetch every topic in rate-limited batches
/// 4. Return the aggregated successes and failures
///
/// # Arguments
///
/// * `config` - The scrape configuration
///
/// # Returns
///
/// * `Ok(RunOutput)` - Scrape completed (possibly with per-topic failures)
/// * `Err(HarvestError)` - Scrape could not run at all
pub async fn scrape(config: Config) -> Result<RunOutput, HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
