pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod profiles;
pub mod server;
pub mod store;

#[cfg(test)]
pub mod tests;

pub use config::*;
pub use error::*;
pub use server::*;

use anyhow::Result;
use tracing::{info, warn};

use crate::auth::AccessComponents;
use crate::observability::{MetricsConfig, init_metrics};

/// Load configuration from the CLI and environment, then serve
///
/// Logging is left to the caller.
pub async fn run_server(cli: &Cli) -> Result<()> {
    let config = config::load_config(cli)?;
    run(config).await
}

/// Build the access layer from `config` and serve until shutdown
pub async fn run(config: AppConfig) -> Result<()> {
    if let Err(e) = init_metrics(MetricsConfig {
        environment: config.environment.as_str().to_string(),
    }) {
        warn!(error = %e, "Continuing without metrics exposition");
    }

    info!(
        backend = %config.store.backend,
        profile_ttl_secs = config.cache.profile_ttl_seconds,
        role_ttl_secs = config.cache.role_ttl_seconds,
        "Creating access components"
    );
    let components = AccessComponents::from_config(&config).await?;

    server::start_server(config, components).await
}
