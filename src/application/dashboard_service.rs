// Dashboard service - Owns the tile collection and applies layout changes
use crate::application::layout_store::LayoutStore;
use crate::domain::dashboard::{GridRect, LayoutDocument, LayoutEntry, Tile, TileCollection};
use crate::domain::error::{DashboardError, Result};
use crate::domain::gesture::{DrawGesture, DrawOutcome, TileDetails};
use crate::domain::grid::GridGeometry;
use crate::domain::telemetry::SeriesView;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

/// Tile collection as published to subscribers after every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub revision: u64,
    pub tiles: Vec<Tile>,
}

/// A tile to add. Without an id one is minted. Without a layout the tile gets the
/// default span in the first free row.
#[derive(Debug, Clone)]
pub struct NewTile {
    pub id: Option<String>,
    pub title: String,
    pub sensor_type: String,
    pub layout: Option<GridRect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBinding {
    pub tile_id: String,
    pub sensor_type: String,
}

#[derive(Default)]
struct DashboardState {
    tiles: TileCollection,
    gesture: DrawGesture,
    /// Bumped on every change that must reach the store.
    revision: u64,
    /// Last refresh cycle started.
    issued_refresh: u64,
    /// Last refresh cycle whose results were applied.
    applied_refresh: u64,
}

impl DashboardState {
    fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            revision: self.revision,
            tiles: self.tiles.tiles().to_vec(),
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn LayoutStore>,
    grid: GridGeometry,
    default_span: (u32, u32),
    state: Arc<RwLock<DashboardState>>,
    /// Revision of the last document handed to the store; serializes saves.
    last_saved: Arc<Mutex<u64>>,
    snapshots: Arc<watch::Sender<Arc<DashboardSnapshot>>>,
}

impl DashboardService {
    pub fn new(
        store: Arc<dyn LayoutStore>,
        grid: GridGeometry,
        default_span: (u32, u32),
    ) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self {
            store,
            grid,
            default_span,
            state: Arc::new(RwLock::new(DashboardState::default())),
            last_saved: Arc::new(Mutex::new(0)),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Replace the in-memory tiles with the stored layout. Returns the tile count.
    pub async fn load(&self) -> Result<usize> {
        let document = self
            .store
            .fetch_layout()
            .await
            .map_err(DashboardError::Persistence)?;

        let mut state = self.state.write().await;
        state.tiles = TileCollection::from_document(document);
        let count = state.tiles.len();
        self.publish(&state);

        tracing::info!("Loaded {} tiles from layout store", count);
        Ok(count)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.snapshots.subscribe()
    }

    pub async fn tiles(&self) -> Vec<Tile> {
        self.state.read().await.tiles.tiles().to_vec()
    }

    pub async fn tile(&self, id: &str) -> Option<Tile> {
        self.state.read().await.tiles.get(id).cloned()
    }

    /// Apply drag/resize results and persist. Returns how many tiles moved.
    pub async fn apply_layout(&self, entries: &[LayoutEntry]) -> Result<usize> {
        let (applied, revision, document) = {
            let mut state = self.state.write().await;
            let applied = state.tiles.apply_layout(entries);
            let (revision, document) = self.record_change(&mut state);
            (applied, revision, document)
        };

        tracing::debug!("Applied layout to {} of {} entries", applied, entries.len());
        self.persist(revision, document).await?;
        Ok(applied)
    }

    pub async fn add_tile(&self, new_tile: NewTile) -> Result<Tile> {
        if new_tile.title.trim().is_empty() {
            return Err(DashboardError::InvalidArgument("title must not be empty".to_string()));
        }
        if new_tile.sensor_type.trim().is_empty() {
            return Err(DashboardError::InvalidArgument(
                "sensorType must not be empty".to_string(),
            ));
        }

        let (tile, revision, document) = {
            let mut state = self.state.write().await;
            let id = new_tile.id.unwrap_or_else(|| mint_id(&state.tiles));
            let layout = new_tile.layout.unwrap_or_else(|| {
                let (w, h) = self.default_span;
                GridRect::new(0, state.tiles.next_free_row(), w, h)
            });
            let tile = Tile::new(id, new_tile.title, new_tile.sensor_type, layout);

            state.tiles.add(tile.clone())?;
            let (revision, document) = self.record_change(&mut state);
            (tile, revision, document)
        };

        tracing::info!("Added tile {} ({})", tile.id, tile.sensor_type);
        self.persist(revision, document).await?;
        Ok(tile)
    }

    /// Delete by id. Unknown ids succeed; returns whether a tile was removed.
    pub async fn delete_tile(&self, id: &str) -> Result<bool> {
        let (removed, revision, document) = {
            let mut state = self.state.write().await;
            let removed = state.tiles.delete(id).is_some();
            let (revision, document) = self.record_change(&mut state);
            (removed, revision, document)
        };

        if removed {
            tracing::info!("Deleted tile {}", id);
        }
        self.persist(revision, document).await?;
        Ok(removed)
    }

    pub async fn begin_draw(&self, pixel_x: f64, pixel_y: f64) -> Result<GridRect> {
        let cell = self.grid.cell_at(pixel_x, pixel_y)?;
        Ok(self.state.write().await.gesture.start(cell))
    }

    /// Current rectangle of the gesture, `None` when no gesture is in progress.
    pub async fn update_draw(&self, pixel_x: f64, pixel_y: f64) -> Result<Option<GridRect>> {
        let cell = self.grid.cell_at(pixel_x, pixel_y)?;
        Ok(self.state.write().await.gesture.update(cell))
    }

    /// End the draw gesture, creating a tile when the details are complete.
    pub async fn finish_draw(&self, details: Option<TileDetails>) -> Result<Option<Tile>> {
        let outcome = self.state.write().await.gesture.finish(details);

        match outcome {
            DrawOutcome::Commit { rect, details } => {
                let tile = self
                    .add_tile(NewTile {
                        id: None,
                        title: details.title,
                        sensor_type: details.sensor_type,
                        layout: Some(rect),
                    })
                    .await?;
                Ok(Some(tile))
            }
            DrawOutcome::Discarded | DrawOutcome::Ignored => Ok(None),
        }
    }

    pub async fn cancel_draw(&self) {
        self.state.write().await.gesture.cancel();
    }

    /// Start a refresh cycle: its generation and the sensors to poll.
    pub async fn begin_refresh(&self) -> (u64, Vec<SensorBinding>) {
        let mut state = self.state.write().await;
        state.issued_refresh += 1;

        let bindings = state
            .tiles
            .tiles()
            .iter()
            .filter(|t| !t.sensor_type.is_empty())
            .map(|t| SensorBinding {
                tile_id: t.id.clone(),
                sensor_type: t.sensor_type.clone(),
            })
            .collect();

        (state.issued_refresh, bindings)
    }

    /// Store refreshed series on the tiles that still exist.
    ///
    /// Results from a generation older than the last applied one are dropped.
    pub async fn apply_refresh(
        &self,
        generation: u64,
        updates: Vec<(String, SeriesView)>,
    ) -> bool {
        let mut state = self.state.write().await;
        if generation <= state.applied_refresh {
            tracing::debug!(
                "Dropping stale refresh {} (applied {})",
                generation,
                state.applied_refresh
            );
            return false;
        }
        state.applied_refresh = generation;

        for (tile_id, data) in updates {
            if let Some(tile) = state.tiles.get_mut(&tile_id) {
                tile.data = data;
            }
        }

        self.publish(&state);
        true
    }

    fn record_change(&self, state: &mut DashboardState) -> (u64, LayoutDocument) {
        state.revision += 1;
        self.publish(state);
        (state.revision, state.tiles.to_document())
    }

    fn publish(&self, state: &DashboardState) {
        self.snapshots.send_replace(Arc::new(state.snapshot()));
    }

    async fn persist(&self, revision: u64, document: LayoutDocument) -> Result<()> {
        let mut last_saved = self.last_saved.lock().await;
        if revision < *last_saved {
            tracing::debug!("Layout revision {} superseded by {}", revision, *last_saved);
            return Ok(());
        }
        *last_saved = revision;

        self.store.save_layout(&document).await.map_err(|e| {
            tracing::warn!("Error saving layout revision {}: {:#}", revision, e);
            DashboardError::Persistence(e)
        })
    }
}

fn mint_id(tiles: &TileCollection) -> String {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let id = format!("tile-{}", millis);
        if !tiles.contains(&id) {
            return id;
        }
        millis += 1;
    }
}
