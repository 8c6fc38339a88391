//! Process-local cache provider.
//!
//! Entries expire lazily on read. Useful for single-instance runs and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CacheResult;
use crate::traits::SnapshotCache;

#[derive(Debug, Clone)]
struct CachedEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CachedEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SnapshotCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.data.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it so the map does not grow with dead keys.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(CachedEntry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> CacheResult<()> {
        let entry = CachedEntry {
            data: payload.to_vec(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_payload() {
        let cache = MemoryCache::new();
        cache
            .set("books:all", b"[]", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("books:all").await.unwrap(), Some(b"[]".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_is_a_miss_not_an_error() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set("short", b"value", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_tolerates_absence() {
        let cache = MemoryCache::new();
        cache
            .set("key", b"value", Duration::from_secs(60))
            .await
            .unwrap();

        cache.delete("key").await.unwrap();
        cache.delete("key").await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = MemoryCache::new();
        let clone = cache.clone();
        clone
            .set("key", b"shared", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("key").await.unwrap(), Some(b"shared".to_vec()));
    }
}
