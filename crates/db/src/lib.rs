//! PostgreSQL connection and schema migration for bookshelf.

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const MIGRATIONS_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module     TEXT        NOT NULL,
        id         TEXT        NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (module, id)
    )
"#;

/// Open a pool against `host` and verify it with a round trip.
pub async fn connect(settings: &DatabaseSettings, host: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout())
        .connect(&settings.url_for(host))
        .await
        .with_context(|| format!("failed to connect to database at {}:{}", host, settings.port))?;

    tracing::info!(
        target: "bookshelf-db",
        host,
        port = settings.port,
        database = %settings.name,
        max_connections = settings.max_connections,
        "database pool ready"
    );

    Ok(pool)
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns the number applied.
pub async fn run_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(MIGRATIONS_TABLE_DDL)
        .execute(pool)
        .await
        .context("failed to create schema_migrations table")?;

    let applied: Vec<(String, String)> = sqlx::query_as("SELECT module, id FROM schema_migrations")
        .fetch_all(pool)
        .await
        .context("failed to read applied migrations")?;

    let pending = pending_migrations(migrations, &applied);
    for (module, migration) in &pending {
        tracing::info!(target: "bookshelf-db", module = %module, id = migration.id, "applying migration");

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES ($1, $2)")
            .bind(module.as_str())
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    if pending.is_empty() {
        tracing::info!(target: "bookshelf-db", "schema up to date");
    }

    Ok(pending.len())
}

fn pending_migrations<'a>(
    migrations: &'a [(String, Migration)],
    applied: &[(String, String)],
) -> Vec<&'a (String, Migration)> {
    migrations
        .iter()
        .filter(|(module, migration)| {
            !applied
                .iter()
                .any(|(done_module, done_id)| done_module == module && done_id == migration.id)
        })
        .collect()
}
