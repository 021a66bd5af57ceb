// Tile refresh service - Periodic polling of every tile's sensor feed
use crate::application::dashboard_service::DashboardService;
use crate::application::sample_feed::SeriesLoader;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone)]
pub struct RefreshPlan {
    pub interval: Duration,
    pub limit: u32,
    pub windows: Vec<usize>,
    pub scale_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub generation: u64,
    pub refreshed: usize,
    pub failed: usize,
    pub applied: bool,
}

#[derive(Clone)]
pub struct TileRefresher {
    dashboard: DashboardService,
    loader: SeriesLoader,
    plan: Arc<RefreshPlan>,
}

impl TileRefresher {
    pub fn new(dashboard: DashboardService, loader: SeriesLoader, plan: RefreshPlan) -> Self {
        Self {
            dashboard,
            loader,
            plan: Arc::new(plan),
        }
    }

    /// Poll every tile once. A tile whose fetch fails keeps its previous data.
    pub async fn refresh_once(&self) -> RefreshReport {
        let (generation, bindings) = self.dashboard.begin_refresh().await;

        let fetches = bindings.into_iter().map(|binding| async move {
            let result = self
                .loader
                .load(
                    &binding.sensor_type,
                    self.plan.limit,
                    &self.plan.windows,
                    self.plan.scale_factor,
                )
                .await;
            (binding, result)
        });
        let results = futures::future::join_all(fetches).await;

        let mut updates = Vec::with_capacity(results.len());
        let mut failed = 0;
        for (binding, result) in results {
            match result {
                Ok(series) => updates.push((binding.tile_id, series)),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        "Failed to fetch {} data for tile {}: {:#}",
                        binding.sensor_type,
                        binding.tile_id,
                        e
                    );
                }
            }
        }

        let refreshed = updates.len();
        let applied = self.dashboard.apply_refresh(generation, updates).await;

        tracing::debug!(
            "Refresh {} done: {} refreshed, {} failed",
            generation,
            refreshed,
            failed
        );

        RefreshReport {
            generation,
            refreshed,
            failed,
            applied,
        }
    }

    /// Run `refresh_once` on the plan's interval until `shutdown` flips to true.
    ///
    /// Ticks that fire while a refresh is still in flight are skipped, never
    /// queued. On shutdown the in-flight refresh is aborted so it cannot touch
    /// the dashboard afterwards.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.plan.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight: Option<JoinHandle<RefreshReport>> = None;

            tracing::info!("Tile refresher started ({:?} interval)", self.plan.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if in_flight.as_ref().is_some_and(|handle| !handle.is_finished()) {
                            tracing::debug!("Refresh still in flight, skipping tick");
                            continue;
                        }
                        let refresher = self.clone();
                        let cycle = async move { refresher.refresh_once().await };
                        in_flight = Some(tokio::spawn(cycle));
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            if let Some(handle) = in_flight {
                handle.abort();
            }
            tracing::info!("Tile refresher stopped");
        })
    }
}
