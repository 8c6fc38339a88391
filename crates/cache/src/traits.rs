//! Snapshot cache trait

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CacheResult;

/// Key-value store for serialized snapshots.
///
/// Absence and expiry are `Ok(None)`, never an error.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Get the payload stored under `key`
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `payload` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Delete `key` if present
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Round-trip check against the backend
    async fn ping(&self) -> CacheResult<()>;

    /// Name of the provider, for logs and status output
    fn provider_name(&self) -> &'static str;
}
