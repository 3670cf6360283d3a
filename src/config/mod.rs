//! Configuration module for Discourse-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use discourse_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scraping category: {}", config.forum.category);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, ForumConfig, OutputConfig, ScrapeConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
