use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in tile-grid units. `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn max_x(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn max_y(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    /// True unless one rectangle lies entirely past an edge of the other.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(r.x > self.max_x() || r.y > self.max_y() || r.max_x() < self.x || r.max_y() < self.y)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.max_x() <= self.max_x() && r.max_y() <= self.max_y()
    }
    /// True if the cell at grid coordinate `(x, y)` lies inside this rectangle.
    pub fn contains_cell(&self, x: u32, y: u32) -> bool {
        self.w > 0 && self.h > 0 && x >= self.x && y >= self.y && x <= self.max_x() && y <= self.max_y()
    }
}

/// A placeable unit: a tile-aligned region of one source entry's raster.
///
/// Pieces never own pixels. `entry` indexes the project entry whose decoded
/// raster lives in the [`SourceArena`](crate::source::SourceArena); the
/// sub-region is expressed in tiles relative to that raster's origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Piece {
    pub entry: usize,
    pub sub_x: u32,
    pub sub_y: u32,
    pub width: u32,
    pub height: u32,
}

impl Piece {
    /// The full extent of an entry's raster.
    pub fn whole(entry: usize, width: u32, height: u32) -> Self {
        Self {
            entry,
            sub_x: 0,
            sub_y: 0,
            width,
            height,
        }
    }

    /// A region of this piece; `x,y` are relative to this piece's own origin.
    pub fn sub_piece(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            entry: self.entry,
            sub_x: self.sub_x + x,
            sub_y: self.sub_y + y,
            width,
            height,
        }
    }

    /// Source tile rendered by the cell at `(col, row)` of this piece.
    pub fn tile_at(&self, col: u32, row: u32) -> Tile {
        Tile {
            entry: self.entry,
            column: self.sub_x + col,
            row: self.sub_y + row,
        }
    }
}

/// One grid cell's reference to the source tile it renders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tile {
    pub entry: usize,
    /// Tile column within the source raster.
    pub column: u32,
    /// Tile row within the source raster.
    pub row: u32,
}

/// Statistics about a packing run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PackSummary {
    /// Total number of tilesets (saved or rendered).
    pub num_tilesets: usize,
    /// Pieces placed by searching for free space.
    pub num_placed: usize,
    /// Pieces restored from persisted placement records.
    pub num_replayed: usize,
    /// Sources that had to be split to fit a tileset.
    pub num_split_sources: usize,
    /// Grid cells occupied by tiles across all tilesets.
    pub used_cells: u64,
    /// Grid cells available across all tilesets.
    pub total_cells: u64,
}

impl PackSummary {
    /// Occupancy ratio: used_cells / total_cells (0.0 to 1.0).
    pub fn occupancy(&self) -> f64 {
        if self.total_cells > 0 {
            self.used_cells as f64 / self.total_cells as f64
        } else {
            0.0
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Tilesets: {}, Placed: {}, Replayed: {}, Split sources: {}, Occupancy: {:.2}% ({}/{} cells)",
            self.num_tilesets,
            self.num_placed,
            self.num_replayed,
            self.num_split_sources,
            self.occupancy() * 100.0,
            self.used_cells,
            self.total_cells,
        )
    }
}
