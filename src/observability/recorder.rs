//! Prometheus metrics recorder
//!
//! The recorder is process-global. It is installed once at startup and
//! rendered by the `/metrics` route on the main listener.

use std::sync::{Arc, OnceLock};

use anyhow::{Result, anyhow};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Service environment, attached to every series
    pub environment: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
        }
    }
}

pub struct MetricsManager {
    handle: PrometheusHandle,
    config: MetricsConfig,
}

impl MetricsManager {
    fn install(config: MetricsConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .add_global_label("service", "profile-authz")
            .add_global_label("environment", &config.environment)
            .add_global_label("version", env!("CARGO_PKG_VERSION"))
            .install_recorder()
            .map_err(|e| anyhow!("Failed to install Prometheus recorder: {}", e))?;

        tracing::info!(
            environment = %config.environment,
            "Prometheus metrics recorder initialized"
        );

        Ok(Self { handle, config })
    }

    /// Get Prometheus metrics output
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

/// Global metrics instance; `None` if installation failed
static METRICS_MANAGER: OnceLock<Option<Arc<MetricsManager>>> = OnceLock::new();

/// Install the global recorder
///
/// Only the first call installs anything; later calls report whether that
/// first installation succeeded.
pub fn init_metrics(config: MetricsConfig) -> Result<()> {
    let installed = METRICS_MANAGER.get_or_init(|| match MetricsManager::install(config) {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
            tracing::error!(error = %e, "Metrics recorder unavailable");
            None
        }
    });

    match installed {
        Some(_) => Ok(()),
        None => Err(anyhow!("Metrics recorder could not be installed")),
    }
}

/// Get global metrics manager instance
pub fn get_metrics_manager() -> Result<Arc<MetricsManager>> {
    METRICS_MANAGER
        .get()
        .cloned()
        .flatten()
        .ok_or_else(|| anyhow!("Metrics manager not initialized. Call init_metrics() first."))
}
