//! CityOS Live-View Service
//!
//! Main entry point for the live-view service.

use cityos_liveview::{
    config_sync::{self, ConfigSyncClient},
    device_directory::DeviceDirectory,
    live_view::LiveViewEngine,
    realtime_hub::RealtimeHub,
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cityos_liveview=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CityOS live-view service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        cityos_api_url = %config.cityos_api_url,
        "Configuration loaded"
    );

    // Initialize components
    let realtime = Arc::new(RealtimeHub::new());
    let sync_client = Arc::new(ConfigSyncClient::new(config.cityos_api_url.clone()));
    let directory = Arc::new(DeviceDirectory::new(config.cityos_api_url.clone()));

    let (sync_handle, sync_rx) = config_sync::channel();
    config_sync::spawn_writer(sync_client.clone(), sync_rx);
    tracing::info!("ConfigSync writer started");

    let engine = Arc::new(LiveViewEngine::new(realtime.clone(), sync_handle));

    // One-time hydration; a failed read keeps the local defaults
    match sync_client.read_live_view_config().await {
        Ok(remote) => engine.hydrate(remote).await,
        Err(e) => {
            tracing::warn!(error = %e, "Live-view config read failed, using defaults");
        }
    }

    // Create application state
    let state = AppState {
        config: config.clone(),
        engine: engine.clone(),
        directory,
        realtime,
        started_at: Instant::now(),
    };

    let app = web_api::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(engine))
        .await?;

    Ok(())
}

/// Stop the rotation timer before the server exits
async fn shutdown_signal(engine: Arc<LiveViewEngine>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, stopping autoplay timer");
    engine.shutdown().await;
}
