use std::sync::Arc;

use anyhow::Context;
use bookshelf_app::{bootstrap, modules::books::store::PgBookStore};
use bookshelf_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, "bookshelf-app bootstrap starting");

    let pool = bootstrap::connect_database(&settings.database).await?;
    let cache = bootstrap::connect_cache(&settings.cache).await;
    let registry = bootstrap::build_registry(Arc::new(PgBookStore::new(pool.clone())), cache);

    let applied = bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to migrate database")?;
    tracing::info!(applied, "migrations complete");

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf-app bootstrap complete");

    let app = bookshelf_http::build_router(&registry, &settings);
    let served = bookshelf_http::start_server(app, &settings).await;

    registry.stop_modules().await?;
    pool.close().await;

    served
}
