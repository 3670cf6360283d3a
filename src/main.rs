//! Discourse-Harvest main entry point
//!
//! Command-line interface for scraping discussion threads from a
//! Discourse-based forum.

use clap::Parser;
use discourse_harvest::config::{load_config_with_hash, Config};
use discourse_harvest::output::{load_failed_slugs, write_discussions, write_failed_slugs};
use discourse_harvest::scraper::Coordinator;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Discourse-Harvest: a batched Discourse forum scraper
///
/// Walks a category's paginated listing, fetches every topic's full JSON
/// payload in rate-limited batches, and writes the combined discussions
/// (and any failed slugs) to the data directory.
#[derive(Parser, Debug)]
#[command(name = "discourse-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A batched Discourse forum scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without any network calls
    #[arg(long, conflicts_with = "refetch")]
    dry_run: bool,

    /// Retry only the slugs recorded in a previous failed-slugs file
    #[arg(long, value_name = "FILE")]
    refetch: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if let Some(failed_file) = cli.refetch {
        handle_refetch(config, &failed_file).await?;
    } else {
        handle_scrape(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("discourse_harvest=info,warn"),
            1 => EnvFilter::new("discourse_harvest=debug,info"),
            2 => EnvFilter::new("discourse_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the scrape plan
fn handle_dry_run(config: &Config) {
    println!("=== Discourse-Harvest Dry Run ===\n");

    println!("Forum:");
    println!("  Base URL: {}", config.forum.base_url);
    println!("  Category: {}", config.forum.category);

    println!("\nScrape:");
    println!("  Pages: {} x {} topics", config.scrape.page_count, config.scrape.page_size);
    println!("  Batch size: {}", config.scrape.batch_size);
    println!("  Rate budget: {} req/s", config.scrape.requests_per_second);
    println!("  Max connections: {}", config.scrape.max_connections);
    println!(
        "  Retries: {} attempts, {}s apart",
        config.scrape.max_retries, config.scrape.retry_delay_seconds
    );
    println!("  Request timeout: {}s", config.scrape.timeout_seconds);

    println!("\nCache:");
    if config.cache.enabled {
        println!("  Enabled: {} (expires after {}h)", config.cache.directory, config.cache.expiry_hours);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Data dir: {}", config.output.data_dir);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch up to {} topics",
        config.scrape.page_count as u64 * config.scrape.page_size as u64
    );
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let category = config.forum.category.clone();
    let data_dir = PathBuf::from(&config.output.data_dir);

    let mut coordinator = Coordinator::new(config)?;
    let output = coordinator.run().await?;

    write_discussions(&data_dir, &category, &output)?;
    write_failed_slugs(&data_dir, &category, &output)?;

    println!(
        "Scrape of '{}' complete: {} succeeded, {} failed",
        category,
        output.successes.len(),
        output.failures.len()
    );

    Ok(())
}

/// Handles the --refetch mode: retries a recorded failure set
async fn handle_refetch(
    config: Config,
    failed_file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = load_failed_slugs(failed_file)?;
    let data_dir = PathBuf::from(&config.output.data_dir);

    if record.failed_slugs.is_empty() {
        println!("No failed slugs in {}", failed_file.display());
        return Ok(());
    }

    tracing::info!(
        "Refetching {} slugs from {} (category '{}')",
        record.failed_slugs.len(),
        failed_file.display(),
        record.category
    );

    let mut coordinator = Coordinator::new(config)?;
    let output = coordinator.refetch(&record.failed_slugs).await;

    let refetched_name = format!("{}_refetched", record.category);
    write_discussions(&data_dir, &refetched_name, &output)?;
    write_failed_slugs(&data_dir, &record.category, &output)?;

    println!(
        "Refetch complete: {} recovered, {} still failing",
        output.successes.len(),
        output.failures.len()
    );

    Ok(())
}
