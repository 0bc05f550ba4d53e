pub mod response;

use crate::config::Config;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::secrets::SecretProvider;
use crate::storage::BlobStoreConnector;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{signal, sync::oneshot};
use tracing::{info, warn};

/// Bind, serve until Ctrl+C / SIGTERM, then drain for at most the configured
/// shutdown timeout.
pub async fn serve(
    config: Config,
    secrets: Arc<dyn SecretProvider>,
    connector: Arc<dyn BlobStoreConnector>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);

    let state = FeatureState {
        config: Arc::new(config),
        secrets,
        connector,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        },
        _ = shutdown_signal() => {},
    }

    stop_tx.send(()).ok();
    info!(
        "Waiting up to {} seconds for connections to close",
        shutdown_timeout.as_secs()
    );

    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(joined) => {
            joined??;
            info!("Server shut down gracefully");
        },
        Err(_) => warn!("Shutdown timeout elapsed; dropping open connections"),
    }

    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState) -> Router {
    let api_v1 = features::router(state);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::tracing_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "csvsync Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
