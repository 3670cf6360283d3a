//! Discourse-Harvest: a batched Discourse forum scraper
//!
//! This crate retrieves discussion threads from a Discourse-based forum by
//! walking a category's paginated listing and fetching each topic's full
//! JSON payload, with a time-expiring request cache, bounded retries, and
//! rate-limited batch scheduling.

pub mod cache;
pub mod categories;
pub mod config;
pub mod output;
pub mod scraper;

use thiserror::Error;

/// Main error type for Discourse-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown category: {name}")]
    UnknownCategory { name: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed JSON body from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Discourse-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::RequestCache;
pub use categories::resolve_category;
pub use config::Config;
pub use scraper::{Coordinator, RunOutput};
