//! Persistent storage for books.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::models::{Book, NewBook};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate isbn)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Source of truth for the catalog.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book; the store assigns `id` and timestamps
    async fn create(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Every book, ordered by id
    async fn list_all(&self) -> Result<Vec<Book>, StoreError>;
}

const INSERT_BOOK: &str = r#"
    INSERT INTO books (title, author, isbn)
    VALUES ($1, $2, $3)
    RETURNING id, title, author, isbn, created_at, updated_at
"#;

const SELECT_BOOKS: &str = r#"
    SELECT id, title, author, isbn, created_at, updated_at
    FROM books
    ORDER BY id
"#;

#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        sqlx::query_as::<_, Book>(INSERT_BOOK)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        let books = sqlx::query_as::<_, Book>(SELECT_BOOKS)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}

fn classify(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return StoreError::ConstraintViolation(db_error.message().to_string());
        }
    }
    StoreError::Unavailable(error)
}

/// In-process store with the same contract as [`PgBookStore`]: sequential ids
/// from 1 and a unique isbn.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: Mutex<Vec<Book>>,
    offline: AtomicBool,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the database were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        self.check_online()?;

        let mut books = self.books.lock().await;
        if books.iter().any(|existing| existing.isbn == book.isbn) {
            return Err(StoreError::ConstraintViolation(format!(
                "duplicate key value violates unique constraint \"books_isbn_key\": isbn {}",
                book.isbn
            )));
        }

        let now = OffsetDateTime::now_utc();
        let stored = Book {
            id: books.last().map_or(1, |last| last.id + 1),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            created_at: now,
            updated_at: now,
        };
        books.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<Book>, StoreError> {
        self.check_online()?;
        Ok(self.books.lock().await.clone())
    }
}
