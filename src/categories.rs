//! Category table for the target Discourse instance
//!
//! Discourse addresses category listings by both name and numeric id, so the
//! scraper carries a fixed mapping. Unknown names are a hard error: there is
//! no way to guess an id, and walking a wrong one would silently scrape the
//! wrong forum section.

use crate::HarvestError;

/// Known categories and their numeric identifiers
const CATEGORIES: &[(&str, u32)] = &[
    ("general", 4),
    ("feature-request", 5),
    ("bug-report", 6),
    ("feedback", 7),
    ("help", 8),
];

/// Resolves a category name to its numeric identifier
///
/// # Returns
///
/// * `Ok(u32)` - The category id
/// * `Err(HarvestError::UnknownCategory)` - The name has no known mapping
pub fn resolve_category(name: &str) -> Result<u32, HarvestError> {
    CATEGORIES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, id)| *id)
        .ok_or_else(|| HarvestError::UnknownCategory {
            name: name.to_string(),
        })
}

/// Returns the known category names, for validation messages
pub fn category_names() -> Vec<&'static str> {
    CATEGORIES.iter().map(|(name, _)| *name).collect()
}
