// Pixel to grid coordinate mapping
use super::dashboard::GridRect;
use super::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
}

impl GridCell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Fixed pixel geometry of the dashboard grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl GridGeometry {
    pub fn new(origin_x: f64, origin_y: f64, cell_width: f64, cell_height: f64) -> Result<Self> {
        check_cell_size("cell width", cell_width)?;
        check_cell_size("cell height", cell_height)?;

        Ok(Self {
            origin_x,
            origin_y,
            cell_width,
            cell_height,
        })
    }

    pub fn cell_at(&self, pixel_x: f64, pixel_y: f64) -> Result<GridCell> {
        pixel_to_grid(
            pixel_x,
            pixel_y,
            self.origin_x,
            self.origin_y,
            self.cell_width,
            self.cell_height,
        )
    }
}

/// Map an absolute pixel position to the grid cell containing it.
pub fn pixel_to_grid(
    pixel_x: f64,
    pixel_y: f64,
    origin_x: f64,
    origin_y: f64,
    cell_width: f64,
    cell_height: f64,
) -> Result<GridCell> {
    check_cell_size("cell width", cell_width)?;
    check_cell_size("cell height", cell_height)?;

    Ok(GridCell::new(
        axis_to_cell(pixel_x, origin_x, cell_width),
        axis_to_cell(pixel_y, origin_y, cell_height),
    ))
}

fn check_cell_size(name: &str, size: f64) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(DashboardError::InvalidArgument(format!(
            "{} must be positive, got {}",
            name, size
        )))
    }
}

// Positions before the origin land in cell 0.
fn axis_to_cell(pixel: f64, origin: f64, cell_size: f64) -> u32 {
    let cell = ((pixel - origin) / cell_size).floor();
    if cell.is_nan() || cell <= 0.0 {
        0
    } else {
        cell.min(u32::MAX as f64) as u32
    }
}

/// Rectangle covering both the anchor cell and the current cell.
pub fn normalize_drag_rectangle(anchor: GridCell, current: GridCell) -> GridRect {
    GridRect::new(
        anchor.x.min(current.x),
        anchor.y.min(current.y),
        anchor.x.abs_diff(current.x).saturating_add(1),
        anchor.y.abs_diff(current.y).saturating_add(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_grid() {
        let cell = pixel_to_grid(250.0, 150.0, 0.0, 0.0, 200.0, 100.0).unwrap();
        assert_eq!(cell, GridCell::new(1, 1));

        let cell = pixel_to_grid(199.9, 99.9, 0.0, 0.0, 200.0, 100.0).unwrap();
        assert_eq!(cell, GridCell::new(0, 0));

        let cell = pixel_to_grid(450.0, 320.0, 50.0, 20.0, 200.0, 100.0).unwrap();
        assert_eq!(cell, GridCell::new(2, 3));
    }

    #[test]
    fn test_pixel_before_origin_snaps_to_first_cell() {
        let cell = pixel_to_grid(10.0, -40.0, 50.0, 0.0, 200.0, 100.0).unwrap();
        assert_eq!(cell, GridCell::new(0, 0));
    }

    #[test]
    fn test_pixel_to_grid_rejects_bad_cell_size() {
        assert!(matches!(
            pixel_to_grid(1.0, 1.0, 0.0, 0.0, 0.0, 100.0),
            Err(DashboardError::InvalidArgument(_))
        ));
        assert!(matches!(
            pixel_to_grid(1.0, 1.0, 0.0, 0.0, 200.0, -5.0),
            Err(DashboardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_normalize_drag_rectangle() {
        let anchor = GridCell::new(2, 2);

        assert_eq!(
            normalize_drag_rectangle(anchor, GridCell::new(2, 2)),
            GridRect::new(2, 2, 1, 1)
        );
        assert_eq!(
            normalize_drag_rectangle(anchor, GridCell::new(0, 4)),
            GridRect::new(0, 2, 3, 3)
        );
        assert_eq!(
            normalize_drag_rectangle(anchor, GridCell::new(5, 0)),
            GridRect::new(2, 0, 4, 3)
        );
    }

    #[test]
    fn test_drag_across_the_whole_axis_saturates() {
        let rect = normalize_drag_rectangle(GridCell::new(0, 0), GridCell::new(u32::MAX, 0));
        assert_eq!(rect, GridRect::new(0, 0, u32::MAX, 1));

        let rect = normalize_drag_rectangle(GridCell::new(u32::MAX, u32::MAX), GridCell::new(0, 0));
        assert_eq!(rect, GridRect::new(0, 0, u32::MAX, u32::MAX));
    }

    #[test]
    fn test_far_pointer_clamps_to_last_cell() {
        let geometry = GridGeometry::new(0.0, 0.0, 200.0, 100.0).unwrap();
        let far = geometry.cell_at(1e15, 50.0).unwrap();
        assert_eq!(far, GridCell::new(u32::MAX, 0));

        let rect = normalize_drag_rectangle(geometry.cell_at(0.0, 0.0).unwrap(), far);
        assert_eq!(rect.w, u32::MAX);
    }

    #[test]
    fn test_cell_at_rejects_unchecked_geometry() {
        let geometry = GridGeometry {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: f64::NAN,
            cell_height: 100.0,
        };
        assert!(matches!(
            geometry.cell_at(10.0, 10.0),
            Err(DashboardError::InvalidArgument(_))
        ));
    }
}
