//! Tracing subscriber bootstrap.

use anyhow::Context;
use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(&settings.log_level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match settings.log_format {
        LogFormat::Pretty => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install pretty subscriber: {}", e))?,
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install json subscriber: {}", e))?,
    }

    tracing::info!(
        target: "bookshelf-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

fn env_filter(default_level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log level '{}'", default_level)),
    }
}
