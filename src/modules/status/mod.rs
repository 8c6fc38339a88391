//! Cache health reporting. Observability only; the book routes never consult it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookshelf_cache::{CacheHandle, CacheStatus};
use bookshelf_kernel::{InitCtx, Module};
use serde::Serialize;

pub struct StatusModule {
    cache: CacheHandle,
}

impl StatusModule {
    pub fn new(cache: CacheHandle) -> Self {
        Self { cache }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStatusBody {
    pub status: &'static str,
    pub message: String,
}

#[async_trait]
impl Module for StatusModule {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            cache_enabled = self.cache.is_enabled(),
            "status module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/redis", get(cache_status))
            .route("/cache", get(cache_status))
            .with_state(self.cache.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let operation = serde_json::json!({
            "get": {
                "summary": "Cache health",
                "tags": ["Status"],
                "responses": {
                    "200": {
                        "description": "Cache connected",
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CacheStatus" }
                            }
                        }
                    },
                    "503": {
                        "description": "Cache disabled at startup or not answering",
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CacheStatus" }
                            }
                        }
                    }
                }
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/redis": operation.clone(),
                "/cache": operation
            },
            "components": {
                "schemas": {
                    "CacheStatus": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "enum": ["connected", "unavailable", "error"] },
                            "message": { "type": "string" }
                        },
                        "required": ["status", "message"]
                    }
                }
            }
        }))
    }
}

/// `GET /redis` and `GET /cache`
async fn cache_status(State(cache): State<CacheHandle>) -> (StatusCode, Json<CacheStatusBody>) {
    let (code, body) = match cache.status().await {
        CacheStatus::Connected => (
            StatusCode::OK,
            CacheStatusBody {
                status: "connected",
                message: format!("{} cache is working", cache.provider_name()),
            },
        ),
        CacheStatus::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            CacheStatusBody {
                status: "unavailable",
                message: "cache not connected".to_string(),
            },
        ),
        CacheStatus::Error(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            CacheStatusBody {
                status: "error",
                message,
            },
        ),
    };

    (code, Json(body))
}

pub fn create_module(cache: CacheHandle) -> Arc<dyn Module> {
    Arc::new(StatusModule::new(cache))
}
