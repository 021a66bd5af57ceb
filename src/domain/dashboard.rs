// Dashboard domain model - tiles and layout reconciliation
use super::error::{DashboardError, Result};
use super::telemetry::SeriesView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tile position and span in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    /// Spans below one cell are clamped to one.
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w: w.max(1),
            h: h.max(1),
        }
    }

    pub fn normalized(self) -> Self {
        Self::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub id: String,
    pub title: String,
    pub sensor_type: String,
    pub layout: GridRect,
    /// Recomputed on every refresh, never persisted.
    pub data: SeriesView,
}

impl Tile {
    pub fn new(id: String, title: String, sensor_type: String, layout: GridRect) -> Self {
        Self {
            id,
            title,
            sensor_type,
            layout: layout.normalized(),
            data: SeriesView::default(),
        }
    }

    pub fn to_persisted(&self) -> PersistedTile {
        PersistedTile {
            id: self.id.clone(),
            title: self.title.clone(),
            sensor_type: self.sensor_type.clone(),
            layout: self.layout,
        }
    }
}

/// The stored form of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTile {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sensor_type: String,
    pub layout: GridRect,
}

impl From<PersistedTile> for Tile {
    fn from(stored: PersistedTile) -> Self {
        Tile::new(stored.id, stored.title, stored.sensor_type, stored.layout)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub tiles: Vec<PersistedTile>,
}

/// A drag/resize result for one tile, as reported by the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    #[serde(rename = "i")]
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutEntry {
    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// Owned tile collection kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileCollection {
    tiles: Vec<Tile>,
}

impl TileCollection {
    /// Builds a collection from stored tiles. Later duplicates of an id are dropped.
    pub fn from_document(document: LayoutDocument) -> Self {
        let mut collection = Self::default();
        for stored in document.tiles {
            if let Err(e) = collection.add(Tile::from(stored)) {
                tracing::warn!("Skipping stored tile: {}", e);
            }
        }
        collection
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// First grid row below every tile; 0 for an empty collection.
    pub fn next_free_row(&self) -> u32 {
        self.tiles
            .iter()
            .map(|t| t.layout.y.saturating_add(t.layout.h))
            .max()
            .unwrap_or(0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    /// Overwrite the layout of every tile named in `entries`.
    ///
    /// Tiles without an entry are left untouched and entries without a tile are
    /// ignored. When an id appears more than once, the first entry wins.
    /// Returns the number of tiles whose layout was set.
    pub fn apply_layout(&mut self, entries: &[LayoutEntry]) -> usize {
        let mut by_id: HashMap<&str, GridRect> = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_id.entry(entry.id.as_str()).or_insert_with(|| entry.rect());
        }

        let mut applied = 0;
        for tile in &mut self.tiles {
            if let Some(rect) = by_id.get(tile.id.as_str()) {
                tile.layout = *rect;
                applied += 1;
            }
        }
        applied
    }

    pub fn add(&mut self, mut tile: Tile) -> Result<()> {
        if self.contains(&tile.id) {
            return Err(DashboardError::DuplicateId(tile.id));
        }
        tile.layout = tile.layout.normalized();
        self.tiles.push(tile);
        Ok(())
    }

    /// Remove the tile with `id`. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<Tile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(index))
    }

    pub fn to_document(&self) -> LayoutDocument {
        LayoutDocument {
            tiles: self.tiles.iter().map(Tile::to_persisted).collect(),
        }
    }
}
