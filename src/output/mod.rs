//! Output collaborator for scrape results
//!
//! Serializes a run's successes to a timestamped discussions file and, when
//! failures exist, records the failure set alongside the category so a later
//! `--refetch` invocation can retry exactly those topics without a full
//! re-walk.

use crate::scraper::RunOutput;
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Failure record written next to the discussions file
#[derive(Debug, Serialize, Deserialize)]
pub struct FailedSlugs {
    pub failed_slugs: Vec<String>,
    pub category: String,
}

/// Writes the run's successes as `{data_dir}/{category}_{timestamp}.json`
///
/// The file holds `{"discussions": [...]}` with the payloads in scheduling
/// order. The data directory is created on demand.
pub fn write_discussions(
    data_dir: &Path,
    category: &str,
    output: &RunOutput,
) -> Result<PathBuf, HarvestError> {
    std::fs::create_dir_all(data_dir)?;

    let path = data_dir.join(format!("{}_{}.json", category, timestamp()));
    let document = serde_json::json!({ "discussions": output.successes });

    let serialized = serde_json::to_string_pretty(&document)
        .map_err(|e| HarvestError::Output(format!("Failed to serialize discussions: {}", e)))?;
    std::fs::write(&path, serialized)?;

    tracing::info!(
        "Wrote {} discussions to {}",
        output.successes.len(),
        path.display()
    );
    Ok(path)
}

/// Writes the run's failure set as `{data_dir}/failed_slugs_{category}_{timestamp}.json`
///
/// Returns `None` without writing when the run had no failures.
pub fn write_failed_slugs(
    data_dir: &Path,
    category: &str,
    output: &RunOutput,
) -> Result<Option<PathBuf>, HarvestError> {
    if output.failures.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(data_dir)?;

    let mut failed_slugs: Vec<String> = output.failures.iter().cloned().collect();
    failed_slugs.sort();

    let record = FailedSlugs {
        failed_slugs,
        category: category.to_string(),
    };

    let path = data_dir.join(format!("failed_slugs_{}_{}.json", category, timestamp()));
    let serialized = serde_json::to_string_pretty(&record)
        .map_err(|e| HarvestError::Output(format!("Failed to serialize failed slugs: {}", e)))?;
    std::fs::write(&path, serialized)?;

    tracing::info!(
        "Saved {} failed slugs to {}",
        record.failed_slugs.len(),
        path.display()
    );
    Ok(Some(path))
}

/// Loads a previously written failed-slugs file for a refetch pass
pub fn load_failed_slugs(path: &Path) -> Result<FailedSlugs, HarvestError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        HarvestError::Output(format!(
            "Failed to parse failed-slugs file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Filesystem-safe local timestamp for output file names
fn timestamp() -> String {
    chrono::Local::now().format("%Y_%m_%d_%H-%M").to_string()
}
