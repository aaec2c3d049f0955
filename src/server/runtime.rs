use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router, middleware,
    routing::{delete, get},
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use super::AppState;
use super::handlers;
use crate::auth::AccessComponents;
use crate::config::AppConfig;
use crate::health::{HealthManager, liveness_handler, readiness_handler};
use crate::middleware::{metrics_middleware, request_id_middleware};
use crate::observability::metrics_endpoint;

/// Serve the HTTP API until SIGINT/SIGTERM
///
/// Owns the cache sweeper: it starts once the listener is bound and is shut
/// down after the server has drained. Draining is bounded by
/// `server.shutdown_timeout`.
pub async fn start_server(config: AppConfig, components: AccessComponents) -> Result<()> {
    info!("Starting server on {}:{}", config.server.bind, config.server.port);

    let health_manager = HealthManager::new(components.store.clone());
    let app = create_router(AppState {
        components: components.clone(),
        health: health_manager.clone(),
    });

    let bind_addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {}. Is another process using this port?",
            bind_addr,
            e
        )
    })?;
    info!("Server successfully bound to {}", bind_addr);

    let sweeper = components.start_sweeper(config.cache.sweep_interval());
    health_manager.mark_ready();

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let served = tokio::select! {
        result = server => result.map_err(anyhow::Error::from),
        _ = async {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(drain_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(timeout_secs = drain_timeout.as_secs(), "Graceful shutdown timed out");
            Ok(())
        }
    };

    sweeper.shutdown().await;
    info!("Server shutdown complete");

    served
}

/// Create the Axum router with all middleware and routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/profiles", get(handlers::get_profiles))
        .route("/roles/{user_id}", get(handlers::get_role))
        .route("/authorize", get(handlers::authorize))
        .route("/cache/users/{user_id}", delete(handlers::invalidate_user))
        .route("/cache/stats", get(handlers::cache_stats));

    Router::new()
        .route("/metrics", get(metrics_endpoint))
        .route("/health", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .nest("/api", api)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
