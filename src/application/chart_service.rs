// Chart service - Full-size chart for a single tile
use crate::application::dashboard_service::DashboardService;
use crate::application::sample_feed::SeriesLoader;
use crate::domain::dashboard::PersistedTile;
use crate::domain::error::{DashboardError, Result};
use crate::domain::telemetry::SeriesView;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub tile: PersistedTile,
    #[serde(flatten)]
    pub series: SeriesView,
}

#[derive(Clone)]
pub struct ChartService {
    dashboard: DashboardService,
    loader: SeriesLoader,
    limit: u32,
    windows: Vec<usize>,
    scale_factor: f64,
}

impl ChartService {
    pub fn new(
        dashboard: DashboardService,
        loader: SeriesLoader,
        limit: u32,
        windows: Vec<usize>,
        scale_factor: f64,
    ) -> Self {
        Self {
            dashboard,
            loader,
            limit,
            windows,
            scale_factor,
        }
    }

    pub async fn chart(&self, tile_id: &str, scale_factor: Option<f64>) -> Result<ChartView> {
        let tile = self
            .dashboard
            .tile(tile_id)
            .await
            .ok_or_else(|| DashboardError::NotFound(tile_id.to_string()))?;

        let scale_factor = scale_factor.unwrap_or(self.scale_factor);
        if !(scale_factor.is_finite() && scale_factor >= 1.0) {
            return Err(DashboardError::InvalidArgument(format!(
                "scale factor must be at least 1, got {}",
                scale_factor
            )));
        }

        let series = self
            .loader
            .load(&tile.sensor_type, self.limit, &self.windows, scale_factor)
            .await
            .map_err(|e| {
                tracing::warn!("Error loading chart data for tile {}: {:#}", tile_id, e);
                DashboardError::Persistence(e)
            })?;

        Ok(ChartView {
            tile: tile.to_persisted(),
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{MemoryLayoutStore, MemorySampleFeed};
    use crate::domain::dashboard::{GridRect, LayoutDocument};
    use crate::domain::grid::GridGeometry;
    use crate::domain::telemetry::{AxisBounds, FeedOrder, Sample};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    async fn service() -> ChartService {
        let store = Arc::new(MemoryLayoutStore::new(LayoutDocument {
            tiles: vec![PersistedTile {
                id: "boiler".to_string(),
                title: "Boiler".to_string(),
                sensor_type: "temperature".to_string(),
                layout: GridRect::new(0, 0, 2, 2),
            }],
        }));
        let grid = GridGeometry::new(0.0, 0.0, 200.0, 100.0).unwrap();
        let dashboard = DashboardService::new(store, grid, (2, 2));
        dashboard.load().await.unwrap();

        let feed = Arc::new(MemorySampleFeed::default());
        let samples = (0..100)
            .map(|i| Sample::new(Utc.timestamp_opt(i, 0).unwrap(), (i % 5) as f64 + 10.0))
            .collect();
        feed.insert("temperature", samples);

        let loader = SeriesLoader::new(feed, FeedOrder::OldestFirst);
        ChartService::new(dashboard, loader, 400, vec![10, 30, 90], 5.0)
    }

    #[tokio::test]
    async fn test_chart_has_all_windows_and_bounds() {
        let charts = service().await;
        let view = charts.chart("boiler", None).await.unwrap();

        assert_eq!(view.tile.title, "Boiler");
        assert_eq!(view.series.points.len(), 100);
        for key in ["avg10", "avg30", "avg90"] {
            assert!(view.series.points[99].averages.contains_key(key));
        }

        let stats = view.series.stats.unwrap();
        assert_eq!((stats.min, stats.max), (10.0, 14.0));
        assert_eq!(view.series.bounds, AxisBounds { min: 2.0, max: 22.0 });

        let narrow = charts.chart("boiler", Some(1.0)).await.unwrap();
        assert_eq!(narrow.series.bounds, AxisBounds { min: 10.0, max: 14.0 });
    }

    #[tokio::test]
    async fn test_unknown_tile_and_bad_scale() {
        let charts = service().await;
        assert!(matches!(
            charts.chart("nope", None).await,
            Err(DashboardError::NotFound(_))
        ));
        assert!(matches!(
            charts.chart("boiler", Some(0.5)).await,
            Err(DashboardError::InvalidArgument(_))
        ));
    }
}
