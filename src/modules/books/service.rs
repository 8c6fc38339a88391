//! Create and list orchestration over the store and the snapshot cache.

use std::sync::Arc;
use std::time::Duration;

use bookshelf_cache::CacheHandle;
use thiserror::Error;

use super::models::{Book, CreateBook};
use super::store::{BookStore, StoreError};

/// Cache key holding the serialized "all books" snapshot.
pub const BOOKS_CACHE_KEY: &str = "books:all";

/// Lifetime of a snapshot; bounds staleness after a racing write.
pub const BOOKS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Whether a list was served from the snapshot or the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
        }
    }
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        details: Vec<serde_json::Value>,
    },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("store unavailable")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl BookError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        BookError::InvalidInput {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

impl From<StoreError> for BookError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ConstraintViolation(message) => BookError::ConstraintViolation(message),
            StoreError::Unavailable(source) => BookError::StoreUnavailable(source),
        }
    }
}

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
    cache: CacheHandle,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, cache: CacheHandle) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    /// Validate, insert, then drop the snapshot so the next list re-reads.
    pub async fn create_book(&self, input: CreateBook) -> Result<Book, BookError> {
        let new_book = input.validate().map_err(|details| BookError::InvalidInput {
            message: "title, author and isbn are required".to_string(),
            details,
        })?;

        let book = self.store.create(new_book).await?;
        tracing::info!(id = book.id, isbn = %book.isbn, "book created");

        self.cache.invalidate(BOOKS_CACHE_KEY).await;

        Ok(book)
    }

    /// Serve the snapshot when present and readable, otherwise read the store
    /// and repopulate.
    pub async fn list_books(&self) -> Result<(Vec<Book>, CacheOutcome), BookError> {
        if let Some(payload) = self.cache.get_snapshot(BOOKS_CACHE_KEY).await {
            match serde_json::from_slice::<Vec<Book>>(&payload) {
                Ok(books) => {
                    tracing::debug!(count = books.len(), "books served from cache");
                    return Ok((books, CacheOutcome::Hit));
                }
                Err(error) => {
                    tracing::warn!(%error, "discarding unreadable books snapshot");
                }
            }
        }

        let books = self.store.list_all().await?;

        if self.cache.is_enabled() {
            match serde_json::to_vec(&books) {
                Ok(payload) => {
                    self.cache
                        .set_snapshot(BOOKS_CACHE_KEY, &payload, BOOKS_CACHE_TTL)
                        .await
                }
                Err(error) => tracing::warn!(%error, "failed to serialize books snapshot"),
            }
        }

        Ok((books, CacheOutcome::Miss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::MemoryBookStore;
    use bookshelf_cache::{MemoryCache, SnapshotCache};

    fn input(title: &str, author: &str, isbn: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
        }
    }

    fn cached_service() -> (BookService, Arc<MemoryBookStore>, MemoryCache) {
        let store = Arc::new(MemoryBookStore::new());
        let cache = MemoryCache::new();
        let service = BookService::new(store.clone(), CacheHandle::enabled(cache.clone()));
        (service, store, cache)
    }

    #[tokio::test]
    async fn create_assigns_id_and_keeps_fields() {
        let (service, _, _) = cached_service();

        let book = service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();

        assert_ne!(book.id, 0);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
        assert_eq!(book.isbn, "111");
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_constraint_violation() {
        let (service, store, _) = cached_service();
        service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();

        let error = service
            .create_book(input("Dune Messiah", "Herbert", "111"))
            .await
            .unwrap_err();

        assert!(matches!(error, BookError::ConstraintViolation(_)));
        let books = store.list_all().await.unwrap();
        assert_eq!(books.iter().filter(|b| b.isbn == "111").count(), 1);
    }

    #[tokio::test]
    async fn blank_fields_are_invalid_input() {
        let (service, store, _) = cached_service();

        let error = service
            .create_book(input("Dune", " ", "111"))
            .await
            .unwrap_err();

        assert!(matches!(error, BookError::InvalidInput { .. }));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_list_is_a_hit_with_identical_books() {
        let (service, _, _) = cached_service();
        service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();

        let (first, first_outcome) = service.list_books().await.unwrap();
        let (second, second_outcome) = service.list_books().await.unwrap();

        assert_eq!(first_outcome, CacheOutcome::Miss);
        assert_eq!(second_outcome, CacheOutcome::Hit);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn hit_does_not_touch_the_store() {
        let (service, store, _) = cached_service();
        service.list_books().await.unwrap();

        store.set_offline(true);
        let (books, outcome) = service.list_books().await.unwrap();

        assert_eq!(outcome, CacheOutcome::Hit);
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn create_invalidates_the_snapshot() {
        let (service, _, cache) = cached_service();
        service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();
        service.list_books().await.unwrap();
        assert!(cache.get(BOOKS_CACHE_KEY).await.unwrap().is_some());

        let created = service
            .create_book(input("Foundation", "Asimov", "222"))
            .await
            .unwrap();
        assert!(cache.get(BOOKS_CACHE_KEY).await.unwrap().is_none());

        let (books, outcome) = service.list_books().await.unwrap();
        assert_eq!(outcome, CacheOutcome::Miss);
        assert_eq!(books.len(), 2);
        assert!(books.contains(&created));
    }

    #[tokio::test]
    async fn unreadable_snapshot_falls_back_to_store() {
        let (service, _, cache) = cached_service();
        service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();
        cache
            .set(BOOKS_CACHE_KEY, b"not json", BOOKS_CACHE_TTL)
            .await
            .unwrap();

        let (books, outcome) = service.list_books().await.unwrap();

        assert_eq!(outcome, CacheOutcome::Miss);
        assert_eq!(books.len(), 1);
        // The bad payload was replaced with a fresh snapshot.
        let (_, outcome) = service.list_books().await.unwrap();
        assert_eq!(outcome, CacheOutcome::Hit);
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let store = Arc::new(MemoryBookStore::new());
        let service = BookService::new(store, CacheHandle::Disabled);
        service
            .create_book(input("Dune", "Herbert", "111"))
            .await
            .unwrap();

        for _ in 0..3 {
            let (books, outcome) = service.list_books().await.unwrap();
            assert_eq!(outcome, CacheOutcome::Miss);
            assert_eq!(books.len(), 1);
        }
    }

    #[tokio::test]
    async fn store_outage_propagates_on_miss() {
        let (service, store, _) = cached_service();
        store.set_offline(true);

        let error = service.list_books().await.unwrap_err();
        assert!(matches!(error, BookError::StoreUnavailable(_)));
    }
}
