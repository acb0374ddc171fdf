// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::{get, post}, Router};
use tokio::sync::watch;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::history_service::{HistoryService, SharedHistory};
use crate::application::poller::Poller;
use crate::application::visibility::{restore_after_ready, RendererReadiness, VisibilityStore};
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::device_client::DeviceClient;
use crate::infrastructure::file_store::FileStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    chart_view, drag, export, health_check, list_channels, renderer_ready, status,
    toggle_channel, zoom,
};

// One logical thread: appends and gestures never run concurrently.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_monitor_config()?;

    // Adapters (infrastructure layer)
    let device = Arc::new(DeviceClient::new(
        config.device.base_url.clone(),
        std::time::Duration::from_millis(config.device.request_timeout_ms),
    )?);
    let file_store = FileStore::new(&config.storage.path);
    tracing::info!("Settings stored in {}", file_store.path().display());
    let visibility_store = VisibilityStore::new(Arc::new(file_store));

    // Session state (application layer)
    let mut service = HistoryService::new(config.history_settings());
    service.set_visibility(visibility_store.load_visibility());
    let history = SharedHistory::new(service);
    let readiness = RendererReadiness::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = Poller::new(device, history.clone(), config.poll_interval());
    let poller_task = tokio::spawn(poller.run(shutdown_rx));

    // Flags loaded above are handed over once the renderer says it is ready
    {
        let readiness = readiness.clone();
        let history = history.clone();
        tokio::spawn(async move {
            let visibility =
                restore_after_ready(readiness.wait(), || history.with(|h| h.visibility().clone()))
                    .await;
            let hidden = visibility.flags().iter().filter(|v| !**v).count();
            tracing::debug!("Restored channel visibility, {} hidden", hidden);
        });
    }

    let state = Arc::new(AppState {
        history,
        visibility_store,
        readiness,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/chart", get(chart_view))
        .route("/status", get(status))
        .route("/export", get(export))
        .route("/channels", get(list_channels))
        .route("/channels/:index/toggle", post(toggle_channel))
        .route("/viewport/zoom", post(zoom))
        .route("/viewport/drag", post(drag))
        .route("/renderer/ready", post(renderer_ready))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.listen.parse()?;
    tracing::info!(
        "Starting miner-telemetry on {}, polling {}",
        addr,
        config.device.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // End the session: no further ticks, in-flight result dropped
    let _ = shutdown_tx.send(true);
    poller_task.await?;

    Ok(())
}
