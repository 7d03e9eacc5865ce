//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` forces `debug`.
pub fn init(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = filter_for(logging, verbose);
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        "full" => registry.with(fmt::layer()).try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}

fn filter_for(logging: &LoggingConfig, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}
