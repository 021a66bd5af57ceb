// Draw-to-create gesture state machine
use super::dashboard::GridRect;
use super::grid::{normalize_drag_rectangle, GridCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing { anchor: GridCell, rect: GridRect },
}

/// What the user typed for a tile once the gesture ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDetails {
    pub title: String,
    pub sensor_type: String,
}

impl TileDetails {
    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.sensor_type.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A tile should be created at `rect`.
    Commit { rect: GridRect, details: TileDetails },
    /// The pending rectangle was thrown away.
    Discarded,
    /// No gesture was in progress.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct DrawGesture {
    state: DrawState,
}

impl DrawGesture {
    #[cfg(test)]
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Anchor at `cell` with a 1x1 rectangle. Restarts a gesture already in progress.
    pub fn start(&mut self, cell: GridCell) -> GridRect {
        let rect = normalize_drag_rectangle(cell, cell);
        self.state = DrawState::Drawing { anchor: cell, rect };
        rect
    }

    /// Recompute the rectangle against the fixed anchor. `None` when idle.
    pub fn update(&mut self, cell: GridCell) -> Option<GridRect> {
        match &mut self.state {
            DrawState::Drawing { anchor, rect } => {
                *rect = normalize_drag_rectangle(*anchor, cell);
                Some(*rect)
            }
            DrawState::Idle => None,
        }
    }

    /// End the gesture. Missing or blank details discard the rectangle.
    pub fn finish(&mut self, details: Option<TileDetails>) -> DrawOutcome {
        match std::mem::take(&mut self.state) {
            DrawState::Idle => DrawOutcome::Ignored,
            DrawState::Drawing { rect, .. } => match details {
                Some(details) if details.is_complete() => DrawOutcome::Commit { rect, details },
                _ => DrawOutcome::Discarded,
            },
        }
    }

    pub fn cancel(&mut self) -> DrawOutcome {
        self.finish(None)
    }
}
