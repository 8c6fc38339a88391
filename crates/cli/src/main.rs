use std::sync::Arc;

use anyhow::Context;
use bookshelf_app::{bootstrap, modules::books::store::PgBookStore};
use bookshelf_cache::{CacheHandle, CacheStatus};
use bookshelf_kernel::{probe, settings::Settings};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Operate a bookshelf deployment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations and exit
    Migrate,
    /// Report which database and cache hosts answer, and which would be used
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Migrate => migrate(&settings).await,
        Command::Check => {
            check(&settings).await;
            Ok(())
        }
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let pool = bootstrap::connect_database(&settings.database).await?;
    let registry =
        bootstrap::build_registry(Arc::new(PgBookStore::new(pool.clone())), CacheHandle::Disabled);

    let applied = bookshelf_db::run_migrations(&pool, &registry.collect_migrations()).await?;
    tracing::info!(applied, "migrate finished");
    println!("applied {} migration(s)", applied);

    pool.close().await;
    Ok(())
}

async fn check(settings: &Settings) {
    let db = &settings.database;
    let db_host = report_hosts("database", &db.host, &db.fallback_host, db.port).await;

    let cache = &settings.cache;
    let cache_host = report_hosts("cache", &cache.host, &cache.fallback_host, cache.port).await;

    let handle = bootstrap::connect_cache(cache).await;
    let status = match handle.status().await {
        CacheStatus::Connected => "connected".to_string(),
        CacheStatus::Unavailable => "unavailable (caching disabled)".to_string(),
        CacheStatus::Error(message) => format!("error: {}", message),
    };
    println!("cache backend {}: {}", handle.provider_name(), status);

    tracing::info!(
        database_host = db_host,
        cache_host,
        cache_backend = handle.provider_name(),
        "connectivity check finished"
    );
}

/// Print the probe result for both hosts and return the one that would be used.
async fn report_hosts<'a>(label: &str, primary: &'a str, fallback: &'a str, port: u16) -> &'a str {
    let primary_up = probe::is_reachable(primary, port, probe::PROBE_TIMEOUT).await;
    let fallback_up = probe::is_reachable(fallback, port, probe::PROBE_TIMEOUT).await;
    let chosen = if primary_up { primary } else { fallback };

    println!(
        "{label}: {primary}:{port} {} | {fallback}:{port} {} -> using {chosen}",
        up_or_down(primary_up),
        up_or_down(fallback_up),
    );
    chosen
}

fn up_or_down(reachable: bool) -> &'static str {
    if reachable {
        "up"
    } else {
        "down"
    }
}
