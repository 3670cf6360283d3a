//! Listing walker for paginated category pages
//!
//! Walks a fixed number of listing pages sequentially and flattens their
//! topic slugs into one ordered sequence. A page that fails to fetch or
//! lacks the expected listing structure contributes nothing but never stops
//! the walk: Discourse page numbering is not guaranteed contiguous in all
//! failure modes, so a null page is not an end-of-pagination signal.

use crate::cache::RequestCache;
use crate::categories::resolve_category;
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;

/// Walks category listing pages and yields topic slugs
pub struct ListingWalker {
    client: Client,
    cache: Arc<RequestCache>,
    base_url: String,
    page_size: u32,
}

impl ListingWalker {
    /// Creates a new walker
    pub fn new(client: Client, cache: Arc<RequestCache>, base_url: String, page_size: u32) -> Self {
        Self {
            client,
            cache,
            base_url,
            page_size,
        }
    }

    /// Lists topic slugs for a category across `page_count` pages
    ///
    /// Pages `0..page_count` are fetched sequentially through the request
    /// cache. Slugs are concatenated in page order, then topic order within
    /// each page. Duplicates across pages are kept; deduplication is the
    /// caller's concern.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - All slugs found, possibly empty
    /// * `Err(HarvestError::UnknownCategory)` - The category has no known
    ///   mapping; raised before any network call
    pub async fn list_topics(
        &self,
        category: &str,
        page_count: u32,
    ) -> Result<Vec<String>, HarvestError> {
        let category_id = resolve_category(category)?;
        let url = format!(
            "{}/c/{}/{}/l/top.json",
            self.base_url, category, category_id
        );

        let mut slugs = Vec::new();

        for page in 0..page_count {
            tracing::info!("Fetching page {} of category '{}'", page, category);

            match self.fetch_page(&url, page).await {
                Ok(page_slugs) => {
                    if page_slugs.is_empty() {
                        tracing::warn!("No topics found on page {}", page);
                    }
                    slugs.extend(page_slugs);
                }
                Err(e) => {
                    // Recovered locally: a bad page is an empty page.
                    tracing::warn!("Listing page {} failed, treating as empty: {}", page, e);
                }
            }
        }

        Ok(slugs)
    }

    /// Fetches and parses one listing page
    async fn fetch_page(&self, url: &str, page: u32) -> Result<Vec<String>, HarvestError> {
        let query = [
            ("filter", "default".to_string()),
            ("page", page.to_string()),
            ("per_page", self.page_size.to_string()),
            ("period", "all".to_string()),
        ];

        let body = self.cache.get_or_fetch(&self.client, url, &query).await?;
        let listing: serde_json::Value =
            serde_json::from_str(&body).map_err(|source| HarvestError::Json {
                url: url.to_string(),
                source,
            })?;

        Ok(extract_slugs(&listing))
    }
}

/// Extracts topic slugs from a listing payload
///
/// Expects `topic_list.topics[]` with a `slug` field on each entry. Any
/// missing level yields an empty list; entries without a string slug are
/// skipped.
pub fn extract_slugs(listing: &serde_json::Value) -> Vec<String> {
    listing
        .get("topic_list")
        .and_then(|list| list.get("topics"))
        .and_then(|topics| topics.as_array())
        .map(|topics| {
            topics
                .iter()
                .filter_map(|topic| topic.get("slug"))
                .filter_map(|slug| slug.as_str())
                .map(|slug| slug.to_string())
                .collect()
        })
        .unwrap_or_default()
}
