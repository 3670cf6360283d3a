//! Batch scheduler for concurrent topic fetching
//!
//! This module handles:
//! - Partitioning slugs into fixed-size batches
//! - Dispatching each batch's fetches concurrently
//! - A global connection cap via semaphore, independent of batch size
//! - Enforcing a minimum delay between batch starts
//! - Accumulating successes (in scheduling order) and failures (as a set)

use crate::config::ScrapeConfig;
use crate::scraper::fetcher::{FetchOutcome, TopicFetcher};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Aggregated result of a scrape run
///
/// Owned by the run that produced it and handed off whole to the output
/// layer. Successes keep the order their slugs were scheduled in; failures
/// are an unordered set available for a later retry pass.
#[derive(Debug, Default)]
pub struct RunOutput {
    /// Successfully fetched discussion payloads, in scheduling order
    pub successes: Vec<serde_json::Value>,

    /// Slugs whose fetches exhausted all retries
    pub failures: HashSet<String>,
}

impl RunOutput {
    /// Total number of slugs this run attempted
    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Drives concurrent fetching of many topics under a concurrency cap and a
/// requests-per-second budget
pub struct BatchScheduler {
    fetcher: Arc<TopicFetcher>,
    batch_size: usize,
    batch_interval: Duration,
    connections: Arc<Semaphore>,
}

impl BatchScheduler {
    /// Creates a new scheduler
    ///
    /// The minimum delay between batch starts is derived from the rate
    /// budget: a batch issues `batch_size` requests, so consecutive starts
    /// are spaced `batch_size / requests_per_second` seconds apart.
    pub fn new(fetcher: Arc<TopicFetcher>, config: &ScrapeConfig) -> Self {
        let batch_interval =
            Duration::from_secs_f64(config.batch_size as f64 / config.requests_per_second);

        Self {
            fetcher,
            batch_size: config.batch_size,
            batch_interval,
            connections: Arc::new(Semaphore::new(config.max_connections)),
        }
    }

    /// Fetches all given slugs and collects the outcomes
    ///
    /// Slugs are processed in consecutive batches of `batch_size`. Every
    /// slug in a batch is dispatched concurrently; the scheduler waits for
    /// the whole batch before starting the next one, and never starts a
    /// batch earlier than `batch_interval` after the previous start. A
    /// single failure never aborts the run: all batches always complete.
    pub async fn run(&self, slugs: &[String]) -> RunOutput {
        let mut output = RunOutput::default();
        if slugs.is_empty() {
            return output;
        }

        let batch_count = slugs.len().div_ceil(self.batch_size);
        tracing::info!(
            "Scheduling {} topics in {} batches of up to {}",
            slugs.len(),
            batch_count,
            self.batch_size
        );

        let mut next_start = Instant::now();

        for (index, batch) in slugs.chunks(self.batch_size).enumerate() {
            tokio::time::sleep_until(next_start).await;
            next_start = Instant::now() + self.batch_interval;

            tracing::debug!("Starting batch {}/{}", index + 1, batch_count);
            self.run_batch(batch, &mut output).await;
        }

        tracing::info!(
            "Scheduling complete: {} succeeded, {} failed",
            output.successes.len(),
            output.failures.len()
        );
        output
    }

    /// Dispatches one batch concurrently and folds its outcomes into `output`
    ///
    /// Completion order within a batch is arbitrary, so outcomes are slotted
    /// back by their position in the batch before successes are appended.
    /// That keeps the successes sequence in scheduling order across the run.
    async fn run_batch(&self, batch: &[String], output: &mut RunOutput) {
        let mut tasks = JoinSet::new();

        for (position, slug) in batch.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let connections = Arc::clone(&self.connections);
            let slug = slug.clone();

            tasks.spawn(async move {
                // The permit holds a connection slot for the whole fetch,
                // including its retries.
                let _permit = connections.acquire_owned().await;
                (position, fetcher.fetch_topic(&slug).await)
            });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = Vec::new();
        outcomes.resize_with(batch.len(), || None);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => outcomes[position] = Some(outcome),
                Err(e) => tracing::error!("Fetch task failed to join: {}", e),
            }
        }

        for (position, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(FetchOutcome::Success { payload, .. }) => output.successes.push(payload),
                Some(FetchOutcome::Failure { slug, error }) => {
                    tracing::warn!("Recording failure for {}: {}", slug, error);
                    output.failures.insert(slug);
                }
                // A panicked task yields no outcome; treat its slug as failed.
                None => {
                    output.failures.insert(batch[position].clone());
                }
            }
        }
    }
}
