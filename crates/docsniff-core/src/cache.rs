//! In-memory result cache with TTL expiry.

use std::time::Duration;

use moka::future::Cache;

use crate::models::ClassificationResult;

/// Entries beyond this are evicted least-recently-used. Results are small,
/// so the cap is generous.
const MAX_CACHED_RESULTS: u64 = 10_000;

/// Memoizes classification results per URL until the TTL lapses.
///
/// A zero TTL disables caching entirely. Nothing is persisted; the cache
/// resets with the process. Expiry is lazy: an expired entry is simply
/// never returned again.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<String, ClassificationResult>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_RESULTS)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    /// Look up a non-expired result for this URL.
    pub async fn get(&self, url: &str) -> Option<ClassificationResult> {
        match &self.inner {
            Some(cache) => cache.get(url).await,
            None => None,
        }
    }

    /// Store a result, replacing any previous entry for the URL.
    pub async fn insert(&self, url: &str, result: ClassificationResult) {
        if let Some(cache) = &self.inner {
            cache.insert(url.to_string(), result).await;
        }
    }
}
