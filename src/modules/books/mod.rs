pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use bookshelf_cache::CacheHandle;
use bookshelf_kernel::{InitCtx, Migration, Module};

use service::BookService;
use store::BookStore;

/// Book catalog: `POST /books` and the cached `GET /books`
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, cache: CacheHandle) -> Self {
        Self {
            service: BookService::new(store, cache),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            cache = self.service.cache().provider_name(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", get(routes::list_books).post(routes::create_book))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "All books, ordered by id",
                                "headers": {
                                    "X-Cache": {
                                        "description": "HIT when served from the snapshot, MISS otherwise",
                                        "schema": { "type": "string", "enum": ["HIT", "MISS"] }
                                    }
                                },
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Store unavailable",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Created",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": {
                                "description": "Missing or malformed fields",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            },
                            "500": {
                                "description": "Duplicate isbn or store unavailable",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string", "description": "Unique across all books" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "isbn", "created_at", "updated_at"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" }
                        },
                        "required": ["title", "author", "isbn"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id         BIGSERIAL   PRIMARY KEY,
                    title      TEXT        NOT NULL CHECK (title <> ''),
                    author     TEXT        NOT NULL CHECK (author <> ''),
                    isbn       TEXT        NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    CONSTRAINT books_isbn_key UNIQUE (isbn)
                );
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>, cache: CacheHandle) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, cache))
}
