//! Persistent TTL cache for geocoding and video lookups.
//!
//! Lookups that hit the cache skip the external call entirely. The cache is
//! never required for correctness: callers log and bypass cache failures.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use rand::RngExt;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

#[derive(Clone)]
pub struct Cache {
    store: Keyspace,
    ttl: Duration,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl Cache {
    /// Opens (or creates) the cache database at `path`
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(Cache { store: items, ttl })
    }

    /// Default TTL with ±10% jitter so entries written together don't expire together
    #[must_use]
    pub fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        self.ttl.mul_f64(jitter)
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

/// Reads `key` from an optional cache, treating every cache failure as a miss
pub async fn lookup<T: DeserializeOwned + Send + 'static>(
    cache: Option<&Cache>,
    key: &str,
) -> Option<T> {
    let cache = cache?;
    match cache.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Cache read failed for {key}: {e:#}");
            None
        }
    }
}

/// Writes `key` to an optional cache with the default jittered TTL, logging failures
pub async fn store<T: Serialize + Send + Debug + 'static>(
    cache: Option<&Cache>,
    key: &str,
    value: T,
) {
    let Some(cache) = cache else {
        return;
    };
    if let Err(e) = cache.put(key, value, cache.jittered_ttl()).await {
        tracing::warn!("Cache write failed for {key}: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path(), Duration::from_secs(3600)).unwrap();

        cache
            .put("video:서울 축제", Some("abc123".to_string()), Duration::from_secs(60))
            .await
            .unwrap();
        let hit: Option<Option<String>> = cache.get("video:서울 축제").await.unwrap();
        assert_eq!(hit, Some(Some("abc123".to_string())));

        cache
            .put("expired", 1u32, Duration::from_secs(0))
            .await
            .unwrap();
        let miss: Option<u32> = cache.get("expired").await.unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn test_optional_cache_helpers() {
        let none: Option<u32> = lookup(None, "anything").await;
        assert_eq!(none, None);

        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path(), Duration::from_secs(3600)).unwrap();
        store(Some(&cache), "geocode:부산", (35.17, 129.07)).await;
        let hit: Option<(f64, f64)> = lookup(Some(&cache), "geocode:부산").await;
        assert_eq!(hit, Some((35.17, 129.07)));
    }

    #[test]
    fn test_jittered_ttl_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::open(dir.path(), Duration::from_secs(1000)).unwrap();
        for _ in 0..20 {
            let ttl = cache.jittered_ttl().as_secs_f64();
            assert!((900.0..=1100.0).contains(&ttl));
        }
    }
}
