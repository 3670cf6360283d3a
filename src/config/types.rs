use serde::Deserialize;

/// Main configuration structure for Discourse-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub forum: ForumConfig,
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Forum endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Base URL of the Discourse instance
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Category to scrape (must appear in the category table)
    pub category: String,
}

/// Scrape behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Number of listing pages to walk (pages 0..page-count)
    #[serde(rename = "page-count")]
    pub page_count: u32,

    /// Topics requested per listing page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Total fetch attempts per topic before it is recorded as failed
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between attempts for the same topic
    #[serde(rename = "retry-delay-seconds", default = "default_retry_delay")]
    pub retry_delay_seconds: u64,

    /// Number of topics fetched concurrently per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Outbound request rate budget, enforced between batch starts
    #[serde(rename = "requests-per-second", default = "default_rps")]
    pub requests_per_second: f64,

    /// Hard ceiling on in-flight connections, independent of batch size
    #[serde(rename = "max-connections", default = "default_max_connections")]
    pub max_connections: usize,

    /// Total timeout for a single request (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Request cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding cache entries (created on demand)
    #[serde(default = "default_cache_dir")]
    pub directory: String,

    /// Hours after which a cached entry is treated as absent
    #[serde(rename = "expiry-hours", default = "default_expiry_hours")]
    pub expiry_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir(),
            expiry_hours: default_expiry_hours(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory for scraped discussions and failed-slug files
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_base_url() -> String {
    "https://forum.cursor.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2
}

fn default_batch_size() -> usize {
    4
}

fn default_rps() -> f64 {
    2.0
}

fn default_max_connections() -> usize {
    8
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    "./.harvest-cache".to_string()
}

fn default_expiry_hours() -> i64 {
    24
}

fn default_data_dir() -> String {
    "./data".to_string()
}
