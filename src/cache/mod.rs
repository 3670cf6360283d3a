//! Content-addressed, time-expiring request cache
//!
//! Every network fetch in the scraper goes through [`RequestCache::get_or_fetch`],
//! which keys responses by a hash of the full request (method + URL +
//! normalized query parameters) and stores them as timestamped JSON files in
//! a local directory. Entries older than the configured expiry window are
//! treated as absent and overwritten on the next successful fetch.
//!
//! Cache write failures degrade to no-cache for that entry: the freshly
//! fetched payload is still returned.

mod entry;

pub use entry::{request_key, CacheEntry};

use crate::config::CacheConfig;
use crate::HarvestError;
use chrono::Duration;
use reqwest::Client;
use std::path::PathBuf;

/// File-backed request cache shared by all fetches within a run
#[derive(Debug)]
pub struct RequestCache {
    enabled: bool,
    directory: PathBuf,
    expiry: Duration,
}

impl RequestCache {
    /// Creates a cache from its configuration section
    ///
    /// The cache directory is not created here; it is created lazily on the
    /// first write.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            directory: PathBuf::from(&config.directory),
            expiry: Duration::hours(config.expiry_hours),
        }
    }

    /// Creates a disabled cache that always fetches and never stores
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::new(),
            expiry: Duration::hours(24),
        }
    }

    /// Whether caching is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fetches a GET request through the cache
    ///
    /// # Request Flow
    ///
    /// 1. Compute the request identity hash
    /// 2. If enabled and a non-expired entry exists, return its body with no
    ///    network I/O
    /// 3. Otherwise perform the fetch; non-2xx statuses are errors, and so
    ///    is a body that is not valid JSON (both forum endpoints serve
    ///    JSON). A malformed body is never written to the cache, so retries
    ///    and later refetch passes re-hit the network for it
    /// 4. If enabled, persist `(now, body)` under the identity before
    ///    returning (failures logged, not propagated)
    ///
    /// # Arguments
    ///
    /// * `client` - The shared HTTP client
    /// * `url` - The request URL, without query string
    /// * `query` - Query parameters, appended to the request as given
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body, cached or fresh
    /// * `Err(HarvestError)` - The underlying fetch failed (the cache itself
    ///   does not retry)
    pub async fn get_or_fetch(
        &self,
        client: &Client,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, HarvestError> {
        let key = request_key("GET", url, query);

        if self.enabled {
            if let Some(entry) = self.load(&key) {
                if !entry.is_expired(self.expiry) {
                    tracing::debug!("Cache hit for {} (age {}s)", url, entry.age().num_seconds());
                    return Ok(entry.body);
                }
                tracing::debug!("Cache entry for {} expired, refetching", url);
            }
        }

        let response = client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        // A 200 with a non-JSON body is still a failed fetch; caching it
        // would replay the garbage on every retry within the expiry window.
        if let Err(source) = serde_json::from_str::<serde_json::Value>(&body) {
            return Err(HarvestError::Json {
                url: url.to_string(),
                source,
            });
        }

        if self.enabled {
            if let Err(e) = self.store(&key, &CacheEntry::new(body.clone())) {
                // Degrade to no-cache for this entry; the payload is still good.
                tracing::warn!("Cache write failed for {}: {}", url, e);
            }
        }

        Ok(body)
    }

    /// Loads an entry by key, returning None for missing or unreadable files
    fn load(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Discarding unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Persists an entry, creating the cache directory on demand
    ///
    /// The entry is written to a temp file and renamed into place, so readers
    /// never observe a partial write and concurrent writers of the same
    /// identity are last-write-wins.
    fn store(&self, key: &str, entry: &CacheEntry) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.directory)?;

        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");

        let serialized = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &path)?;

        Ok(())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_cache(dir: &Path, expiry_hours: i64) -> RequestCache {
        RequestCache {
            enabled: true,
            directory: dir.to_path_buf(),
            expiry: Duration::hours(expiry_hours),
        }
    }

    #[test]
    fn test_store_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 24);

        let entry = CacheEntry::new("payload".to_string());
        cache.store("abc123", &entry).unwrap();

        let loaded = cache.load("abc123").expect("entry should load");
        assert_eq!(loaded.body, "payload");
    }

    #[test]
    fn test_load_missing_entry() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 24);
        assert!(cache.load("nothing-here").is_none());
    }

    #[test]
    fn test_load_corrupt_entry_treated_as_missing() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 24);

        std::fs::write(dir.path().join("bad.json"), "not json at all").unwrap();
        assert!(cache.load("bad").is_none());
    }

    #[test]
    fn test_store_creates_directory_on_demand() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("deep").join("cache");
        let cache = test_cache(&nested, 24);

        cache
            .store("key", &CacheEntry::new("x".to_string()))
            .unwrap();
        assert!(nested.join("key.json").exists());
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 24);

        cache
            .store("key", &CacheEntry::new("first".to_string()))
            .unwrap();
        cache
            .store("key", &CacheEntry::new("second".to_string()))
            .unwrap();

        assert_eq!(cache.load("key").unwrap().body, "second");
    }

    #[test]
    fn test_expired_entry_detected() {
        let dir = tempdir().unwrap();
        let cache = test_cache(dir.path(), 24);

        let mut entry = CacheEntry::new("old".to_string());
        entry.fetched_at = Utc::now() - Duration::hours(25);
        cache.store("stale", &entry).unwrap();

        let loaded = cache.load("stale").unwrap();
        assert!(loaded.is_expired(cache.expiry));
    }

    #[test]
    fn test_disabled_cache_reports_disabled() {
        assert!(!RequestCache::disabled().is_enabled());
    }
}
