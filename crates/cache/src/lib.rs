//! Optional look-aside cache for serialized snapshots.
//!
//! The service layer only talks to [`CacheHandle`]. A handle is decided once at
//! startup: either a live provider or `Disabled` for the rest of the process.
//! Provider failures never leave the handle; reads degrade to a miss and
//! writes to a no-op.

pub mod errors;
pub mod providers;
pub mod traits;

use std::sync::Arc;
use std::time::Duration;

pub use errors::{CacheError, CacheResult};
pub use providers::{MemoryCache, RedisCache};
pub use traits::SnapshotCache;

/// Reported health of the cache handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Enabled and answered a ping
    Connected,
    /// Disabled at startup
    Unavailable,
    /// Enabled but the ping failed
    Error(String),
}

#[derive(Clone, Default)]
pub enum CacheHandle {
    #[default]
    Disabled,
    Enabled(Arc<dyn SnapshotCache>),
}

impl std::fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheHandle::Disabled => f.write_str("CacheHandle::Disabled"),
            CacheHandle::Enabled(cache) => f
                .debug_tuple("CacheHandle::Enabled")
                .field(&cache.provider_name())
                .finish(),
        }
    }
}

impl CacheHandle {
    pub fn enabled(cache: impl SnapshotCache + 'static) -> Self {
        CacheHandle::Enabled(Arc::new(cache))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, CacheHandle::Enabled(_))
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            CacheHandle::Disabled => "disabled",
            CacheHandle::Enabled(cache) => cache.provider_name(),
        }
    }

    /// Fetch a snapshot. Disabled handles and backend errors are a miss.
    pub async fn get_snapshot(&self, key: &str) -> Option<Vec<u8>> {
        let CacheHandle::Enabled(cache) = self else {
            return None;
        };

        match cache.get(key).await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(key, %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a snapshot, best-effort.
    pub async fn set_snapshot(&self, key: &str, payload: &[u8], ttl: Duration) {
        let CacheHandle::Enabled(cache) = self else {
            return;
        };

        if let Err(error) = cache.set(key, payload, ttl).await {
            tracing::warn!(key, %error, "cache write failed, ignoring");
        }
    }

    /// Remove a snapshot, best-effort.
    pub async fn invalidate(&self, key: &str) {
        let CacheHandle::Enabled(cache) = self else {
            return;
        };

        if let Err(error) = cache.delete(key).await {
            tracing::warn!(key, %error, "cache invalidation failed, ignoring");
        }
    }

    pub async fn status(&self) -> CacheStatus {
        match self {
            CacheHandle::Disabled => CacheStatus::Unavailable,
            CacheHandle::Enabled(cache) => match cache.ping().await {
                Ok(()) => CacheStatus::Connected,
                Err(error) => CacheStatus::Error(error.to_string()),
            },
        }
    }
}
