use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Set up tracing subscriber based on configuration
///
/// Supports two formats:
/// - "json": Structured JSON output for production
/// - "pretty": Human-readable format for development
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn setup_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init()?;
        }
        "pretty" => {
            let pretty_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(pretty_layer)
                .try_init()?;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported log format: {}. Use 'json' or 'pretty'",
                config.format
            ));
        }
    }

    Ok(())
}

/// Route panics through tracing so they land in the structured log
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(?panic_info, "FATAL: Panic occurred");
        std::process::exit(1);
    }));
}
