// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartService;
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_service::TileRefresher;
use crate::application::sample_feed::SeriesLoader;
use crate::application::settings_service::SettingsService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_backend::HttpBackend;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_tile, apply_layout, backend_health, delete_tile, draw_cancel, draw_end, draw_move,
    draw_start, get_settings, health_check, list_tiles, patch_settings, stream_tiles, tile_chart,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let app_config = load_app_config()?;
    let grid = app_config.grid_geometry()?;

    // Backend client (infrastructure layer)
    let backend = Arc::new(HttpBackend::new(
        app_config.backend.base_url.clone(),
        Duration::from_secs(app_config.backend.timeout_secs),
    )?);

    // Services (application layer)
    let dashboard = DashboardService::new(
        backend.clone(),
        grid,
        (app_config.grid.default_w, app_config.grid.default_h),
    );
    if let Err(e) = dashboard.load().await {
        tracing::warn!("Error fetching layout, starting with no tiles: {}", e);
    }

    let loader = SeriesLoader::new(backend.clone(), app_config.refresh.feed_order);
    let charts = ChartService::new(
        dashboard.clone(),
        loader.clone(),
        app_config.chart.limit,
        app_config.chart.windows.clone(),
        app_config.chart.scale_factor,
    );
    let settings = SettingsService::new(backend.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = TileRefresher::new(dashboard.clone(), loader, app_config.refresh_plan())
        .spawn(shutdown_rx.clone());

    let state = Arc::new(AppState {
        dashboard,
        charts,
        settings,
        backend,
        shutdown: shutdown_rx,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/healthz/backend", get(backend_health))
        .route("/tiles", get(list_tiles).post(add_tile))
        .route("/tiles/stream", get(stream_tiles))
        .route("/tiles/:id", delete(delete_tile))
        .route("/tiles/:id/chart", get(tile_chart))
        .route("/layout", put(apply_layout))
        .route("/draw/start", post(draw_start))
        .route("/draw/move", post(draw_move))
        .route("/draw/end", post(draw_end))
        .route("/draw/cancel", post(draw_cancel))
        .route("/settings", get(get_settings).patch(patch_settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", app_config.server.bind))?;
    tracing::info!("Starting iamis-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            // Ends the refresher and every open tile stream.
            let _ = shutdown_tx.send(true);
        })
        .await?;

    refresher.await?;

    Ok(())
}
