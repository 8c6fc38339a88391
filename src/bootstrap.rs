//! Startup wiring: resolve hosts, open the adapters, assemble modules.

use std::sync::Arc;

use bookshelf_cache::{CacheHandle, MemoryCache, RedisCache};
use bookshelf_kernel::probe;
use bookshelf_kernel::settings::{CacheBackendKind, CacheSettings, DatabaseSettings};
use bookshelf_kernel::ModuleRegistry;
use sqlx::PgPool;

use crate::modules::{self, books::store::BookStore};

/// Connect to PostgreSQL on whichever configured host answers.
/// Failure here is fatal to startup.
pub async fn connect_database(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let host = probe::resolve_host(&settings.host, &settings.fallback_host, settings.port).await;
    bookshelf_db::connect(settings, &host).await
}

/// Decide the cache handle for the process lifetime.
///
/// Any Redis failure here yields `Disabled`; there is no later reconnect.
pub async fn connect_cache(settings: &CacheSettings) -> CacheHandle {
    match settings.backend {
        CacheBackendKind::Disabled => {
            tracing::info!("cache disabled by configuration");
            CacheHandle::Disabled
        }
        CacheBackendKind::Memory => {
            tracing::info!("using in-process memory cache");
            CacheHandle::enabled(MemoryCache::new())
        }
        CacheBackendKind::Redis => {
            let host =
                probe::resolve_host(&settings.host, &settings.fallback_host, settings.port).await;
            match RedisCache::connect(&settings.url_for(&host), settings.op_timeout()).await {
                Ok(cache) => {
                    tracing::info!(host = %host, port = settings.port, "Redis connected");
                    CacheHandle::enabled(cache)
                }
                Err(error) => {
                    tracing::warn!(
                        host = %host,
                        port = settings.port,
                        %error,
                        "Redis connection failed, continuing without cache"
                    );
                    CacheHandle::Disabled
                }
            }
        }
    }
}

/// Registry with every application module sharing the given adapters.
pub fn build_registry(store: Arc<dyn BookStore>, cache: CacheHandle) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, cache);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::MemoryBookStore;

    #[tokio::test]
    async fn disabled_backend_yields_disabled_handle() {
        let settings = CacheSettings {
            backend: CacheBackendKind::Disabled,
            ..CacheSettings::default()
        };
        assert!(!connect_cache(&settings).await.is_enabled());
    }

    #[tokio::test]
    async fn memory_backend_is_enabled() {
        let settings = CacheSettings {
            backend: CacheBackendKind::Memory,
            ..CacheSettings::default()
        };
        let handle = connect_cache(&settings).await;
        assert_eq!(handle.provider_name(), "memory");
    }

    #[tokio::test]
    async fn unreachable_redis_disables_cache() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let settings = CacheSettings {
            backend: CacheBackendKind::Redis,
            host: "127.0.0.1".to_string(),
            fallback_host: "127.0.0.1".to_string(),
            port,
            op_timeout_ms: 200,
            ..CacheSettings::default()
        };

        assert!(!connect_cache(&settings).await.is_enabled());
    }

    #[test]
    fn registry_contains_status_and_books() {
        let registry = build_registry(Arc::new(MemoryBookStore::new()), CacheHandle::Disabled);

        assert!(registry.get_module("status").is_some());
        assert!(registry.get_module("books").is_some());

        let migrations = registry.collect_migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].0, "books");
    }
}
