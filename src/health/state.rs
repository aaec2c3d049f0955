use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{ProfileStore, StoreHealth};

/// Health status for individual services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is fully operational
    Healthy,
    /// Service is not operational
    Unhealthy,
    /// Service is still starting up
    Starting,
}

/// Information about a service's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    /// Human-readable description
    pub message: String,
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status (worst of all services)
    pub status: HealthStatus,
    /// Map of service name to health info
    pub services: HashMap<String, ServiceHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Total time this service has been running
    pub uptime_seconds: u64,
}

/// Tracks process readiness and probes the profile store on demand
#[derive(Clone)]
pub struct HealthManager {
    store: Arc<dyn ProfileStore>,
    ready: Arc<AtomicBool>,
    startup_time: Instant,
    startup_grace_period: Duration,
}

impl HealthManager {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            ready: Arc::new(AtomicBool::new(false)),
            startup_time: Instant::now(),
            startup_grace_period: Duration::from_secs(30),
        }
    }

    /// Mark the API as ready (called once the listener is bound)
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        info!("API service marked as ready");
    }

    pub async fn get_health(&self) -> HealthResponse {
        let mut services = HashMap::new();

        let api = if self.ready.load(Ordering::SeqCst) {
            ServiceHealth {
                status: HealthStatus::Healthy,
                message: "API server is ready".to_string(),
            }
        } else {
            ServiceHealth {
                status: HealthStatus::Starting,
                message: "API server starting up".to_string(),
            }
        };
        services.insert("api".to_string(), api);

        let store = match self.store.health_check().await {
            StoreHealth::Healthy => ServiceHealth {
                status: HealthStatus::Healthy,
                message: "Profile store reachable".to_string(),
            },
            StoreHealth::Unhealthy(reason) => ServiceHealth {
                status: HealthStatus::Unhealthy,
                message: reason,
            },
        };
        services.insert("store".to_string(), store);

        let status = services
            .values()
            .map(|s| &s.status)
            .min_by_key(|status| status_priority(status))
            .cloned()
            .unwrap_or(HealthStatus::Healthy);

        HealthResponse {
            status,
            services,
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.startup_time.elapsed().as_secs(),
        }
    }

    /// Check if we're still in startup grace period
    pub fn is_in_startup_period(&self) -> bool {
        self.startup_time.elapsed() < self.startup_grace_period
    }
}

/// Lower is worse
fn status_priority(status: &HealthStatus) -> u8 {
    match status {
        HealthStatus::Unhealthy => 0,
        HealthStatus::Starting => 1,
        HealthStatus::Healthy => 2,
    }
}
