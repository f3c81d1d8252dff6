use std::sync::Arc;

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;
use service::{file::snapshot_store::FileSnapshotStore, snapshot::SnapshotRepository};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the snapshot file (creating it with defaults) and build the router.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let store = FileSnapshotStore::new(cfg.storage.data_file.clone()).await?;
    let snapshots: Arc<dyn SnapshotRepository> = store;
    Ok(routes::build_router(AppState::new(snapshots), build_cors()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(event = "shutdown_signal", "received Ctrl+C, draining in-flight requests"),
        Err(e) => {
            error!(error = %e, "cannot listen for Ctrl+C; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = cfg.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    let local_addr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        data_file = %cfg.storage.data_file.display(),
        mode = ?cfg.mode,
        "starting webhook server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
