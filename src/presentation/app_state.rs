// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::dashboard_service::DashboardService;
use crate::application::settings_service::SettingsService;
use crate::infrastructure::http_backend::HttpBackend;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    pub charts: ChartService,
    pub settings: SettingsService,
    pub backend: Arc<HttpBackend>,
    /// Flips to `true` once the server starts shutting down.
    pub shutdown: watch::Receiver<bool>,
}
