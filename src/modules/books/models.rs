use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

/// A catalog entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Store-assigned identifier
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Unique across all books
    pub isbn: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// A validated `CreateBook`, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl CreateBook {
    /// Trim every field and reject blanks.
    ///
    /// On failure returns one `{"field", "error"}` detail per offending field.
    pub fn validate(self) -> Result<NewBook, Vec<serde_json::Value>> {
        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        let isbn = self.isbn.trim().to_string();

        let fields = [("title", &title), ("author", &author), ("isbn", &isbn)];
        let details: Vec<serde_json::Value> = fields
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| json!({"field": field, "error": "required"}))
            .collect();

        if details.is_empty() {
            Ok(NewBook {
                title,
                author,
                isbn,
            })
        } else {
            Err(details)
        }
    }
}
