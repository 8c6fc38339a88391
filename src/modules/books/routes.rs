use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bookshelf_http::error::AppError;

use super::models::{Book, CreateBook};
use super::service::{BookError, BookService};

/// Response header reporting whether the list came from the snapshot.
pub const X_CACHE: &str = "x-cache";

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::InvalidInput { message, details } => {
                AppError::invalid_fields(details, message)
            }
            BookError::ConstraintViolation(message) => AppError::constraint(message),
            BookError::StoreUnavailable(source) => {
                AppError::Internal(anyhow::Error::new(source).context("book store unavailable"))
            }
        }
    }
}

/// `POST /books`
pub async fn create_book(
    State(service): State<BookService>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) =
        payload.map_err(|rejection| BookError::invalid_input(rejection.body_text()))?;

    let book = service.create_book(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// `GET /books`, with `X-Cache: HIT|MISS`
pub async fn list_books(
    State(service): State<BookService>,
) -> Result<impl IntoResponse, AppError> {
    let (books, outcome) = service.list_books().await?;
    Ok(([(X_CACHE, outcome.as_str())], Json(books)))
}
