//! Cache entry representation and request identity hashing

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single cached response body with its fetch timestamp
///
/// Entries are serialized to disk as JSON; the timestamp decides at read
/// time whether the entry still counts as present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the response was fetched
    pub fetched_at: DateTime<Utc>,

    /// The raw response body
    pub body: String,
}

impl CacheEntry {
    /// Creates a new entry stamped with the current time
    pub fn new(body: String) -> Self {
        Self {
            fetched_at: Utc::now(),
            body,
        }
    }

    /// Checks whether the entry has outlived the expiry window
    ///
    /// Expiry is measured from write time and evaluated at read time; an
    /// expired entry is treated exactly like a missing one.
    pub fn is_expired(&self, expiry: Duration) -> bool {
        Utc::now() - self.fetched_at >= expiry
    }

    /// Returns how long ago the entry was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Computes the stable identity of a request
///
/// The identity is a SHA-256 over the method, URL, and query parameters.
/// Query parameters are sorted by key first, so two requests that differ
/// only in parameter order share an identity. Each component is
/// length-prefixed before hashing, so a value containing `&` or `=` can
/// never collide with a differently-shaped parameter list.
pub fn request_key(method: &str, url: &str, query: &[(&str, String)]) -> String {
    let mut params: Vec<(&str, &str)> = query
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .collect();
    params.sort();

    let mut hasher = Sha256::new();
    hash_component(&mut hasher, method);
    hash_component(&mut hasher, url);
    for (k, v) in &params {
        hash_component(&mut hasher, k);
        hash_component(&mut hasher, v);
    }
    hex::encode(hasher.finalize())
}

fn hash_component(hasher: &mut Sha256, component: &str) {
    hasher.update((component.len() as u64).to_le_bytes());
    hasher.update(component.as_bytes());
}
