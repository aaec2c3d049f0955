use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::recorder::get_metrics_manager;

/// Prometheus text exposition of every recorded series
pub async fn metrics_endpoint() -> Response {
    let manager = match get_metrics_manager() {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("Metrics manager not initialized: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Metrics not available").into_response();
        }
    };

    let metrics_content = manager.render();

    tracing::debug!(
        metrics_size = %metrics_content.len(),
        "Metrics served successfully"
    );

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics_content,
    )
        .into_response()
}
