use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, warn};

use super::{HealthManager, HealthStatus};

/// Liveness probe at /health; 200 while the process is up
pub async fn liveness_handler() -> &'static str {
    debug!("Liveness check requested");
    "OK"
}

/// Readiness probe at /health/ready
///
/// Answers 503 when the store is unreachable, or when the server has not
/// marked itself ready once the startup grace period is over.
pub async fn readiness_handler(State(health_manager): State<HealthManager>) -> Response {
    let health = health_manager.get_health().await;

    let status = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Starting if health_manager.is_in_startup_period() => StatusCode::OK,
        HealthStatus::Starting | HealthStatus::Unhealthy => {
            warn!(status = ?health.status, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (status, Json(health)).into_response()
}
