//! Sub-image grid of a tile.

use crate::planner::TileWorkItem;
use crate::provider::CellRequest;

/// One sub-image of a tile mosaic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Row from the north edge
    pub row: u32,
    /// Column from the west edge
    pub col: u32,
    pub request: CellRequest,
}

impl GridCell {
    /// Position in the row-major cell list.
    pub fn index(&self, grid: u32) -> usize {
        (self.row * grid + self.col) as usize
    }
}

/// Split a tile into `grid × grid` equal cells, north row first.
pub fn plan_cells(item: &TileWorkItem) -> Vec<GridCell> {
    let grid = item.grid_size().max(1);
    let bounds = item.bounds;
    let lon_step = bounds.width() / grid as f64;
    let lat_step = bounds.height() / grid as f64;
    let (width, height) = (item.resolution.cell_w(), item.resolution.cell_h());
    let tile_width = item.pixel_w();

    let mut cells = Vec::with_capacity((grid * grid) as usize);
    for row in 0..grid {
        let lat_ur = bounds.lat_max - row as f64 * lat_step;
        for col in 0..grid {
            let lon_ll = bounds.lon_min + col as f64 * lon_step;
            cells.push(GridCell {
                row,
                col,
                request: CellRequest {
                    lat_ll: lat_ur - lat_step,
                    lon_ll,
                    lat_ur,
                    lon_ur: lon_ll + lon_step,
                    width,
                    height,
                    tile_width,
                },
            });
        }
    }
    cells
}
