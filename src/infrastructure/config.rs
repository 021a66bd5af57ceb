use crate::application::refresh_service::RefreshPlan;
use crate::domain::grid::GridGeometry;
use crate::domain::telemetry::FeedOrder;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub grid: GridSettings,
    pub refresh: RefreshSettings,
    pub chart: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GridSettings {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub default_w: u32,
    pub default_h: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 200.0,
            cell_height: 100.0,
            default_w: 4,
            default_h: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub interval_ms: u64,
    pub tile_limit: u32,
    pub tile_windows: Vec<usize>,
    pub feed_order: FeedOrder,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            tile_limit: 100,
            tile_windows: vec![10],
            feed_order: FeedOrder::NewestFirst,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub limit: u32,
    pub windows: Vec<usize>,
    pub scale_factor: f64,
    pub mini_scale_factor: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            limit: 400,
            windows: vec![10, 30, 90],
            scale_factor: 5.0,
            mini_scale_factor: 2.0,
        }
    }
}

impl AppConfig {
    pub fn grid_geometry(&self) -> anyhow::Result<GridGeometry> {
        GridGeometry::new(
            self.grid.origin_x,
            self.grid.origin_y,
            self.grid.cell_width,
            self.grid.cell_height,
        )
        .context("Invalid grid settings")
    }

    pub fn refresh_plan(&self) -> RefreshPlan {
        RefreshPlan {
            interval: Duration::from_millis(self.refresh.interval_ms),
            limit: self.refresh.tile_limit,
            windows: self.refresh.tile_windows.clone(),
            scale_factor: self.chart.mini_scale_factor,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.grid_geometry()?;

        if self.refresh.interval_ms == 0 {
            anyhow::bail!("refresh.interval_ms must be positive");
        }
        if self.refresh.tile_limit == 0 || self.chart.limit == 0 {
            anyhow::bail!("sample limits must be positive");
        }
        if self
            .refresh
            .tile_windows
            .iter()
            .chain(&self.chart.windows)
            .any(|&w| w == 0)
        {
            anyhow::bail!("rolling average windows must be positive");
        }
        if self.chart.scale_factor < 1.0 || self.chart.mini_scale_factor < 1.0 {
            anyhow::bail!("chart scale factors must be at least 1");
        }
        Ok(())
    }
}

/// Load `config/iamis.*` (optional) overlaid with `IAMIS__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/iamis").required(false))
        .add_source(
            config::Environment::with_prefix("IAMIS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    build_app_config(builder)
}

fn build_app_config(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
