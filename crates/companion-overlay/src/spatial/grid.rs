use std::collections::HashMap;

use glam::Vec2;

use crate::api::types::ControlHandle;
use crate::host::window::CoordinateSpace;
use crate::spatial::index::SpatialQuery;

/// Coarse occupancy map of the overlay window.
///
/// Cells are square, `cell_size` pixels wide, in overlay-local coordinates.
/// A cell is blocked when the center of the cell lies over an interactive
/// control. Built from the widget index and replaced whole on each rebuild.
#[derive(Debug, Clone)]
pub struct CollisionGrid {
    cell_size: f32,
    cols: i32,
    rows: i32,
    cells: HashMap<(i32, i32), ControlHandle>,
}

impl CollisionGrid {
    pub fn empty(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cols: 0,
            rows: 0,
            cells: HashMap::new(),
        }
    }

    /// Sample `index` once per cell over a `window`-sized overlay.
    pub fn build(
        index: &mut dyn SpatialQuery,
        space: &dyn CoordinateSpace,
        window: Vec2,
        cell_size: f32,
    ) -> Self {
        let mut grid = Self::empty(cell_size);
        let size = grid.cell_size;
        grid.cols = (window.x.max(0.0) / size).ceil() as i32;
        grid.rows = (window.y.max(0.0) / size).ceil() as i32;

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let center = Vec2::new((col as f32 + 0.5) * size, (row as f32 + 0.5) * size);
                if let Some(control) = index.query_point(space.to_shared(center)) {
                    // Later samples overwrite earlier ones.
                    grid.cells.insert((col, row), control);
                }
            }
        }

        log::debug!(
            "collision grid built: {}x{} cells, {} blocked",
            grid.cols,
            grid.rows,
            grid.cells.len()
        );
        grid
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// (columns, rows) covered by the last build.
    pub fn dimensions(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    pub fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Whether the cell containing the overlay-local point is occupied.
    /// Points outside the window, and non-finite points, are never blocked.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        self.control_at(x, y).is_some()
    }

    /// The control occupying the cell that contains the point.
    pub fn control_at(&self, x: f32, y: f32) -> Option<ControlHandle> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        self.cells.get(&self.cell_of(x, y)).copied()
    }

    pub fn blocked_cells(&self) -> usize {
        self.cells.len()
    }
}
