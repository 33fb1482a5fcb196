use super::algebra::{intersect, subtract_into};
use crate::model::{Piece, Rect, Tile};

/// Lifecycle of a tileset's packing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilesetState {
    /// Nothing placed yet.
    Empty,
    /// At least one region used and free space remains.
    Accepting,
    /// No free rectangle left.
    Full,
    /// Saved; no further placement is accepted.
    Sealed,
}

/// A grid region occupied by a placed piece.
///
/// Holds the `w x h` grid of [`Tile`]s the region renders, row-major.
#[derive(Debug, Clone)]
pub struct UsedRegion {
    rect: Rect,
    piece: Piece,
    tiles: Vec<Tile>,
}

impl UsedRegion {
    fn new(rect: Rect, piece: Piece) -> Self {
        let mut tiles = Vec::with_capacity((rect.w as usize) * (rect.h as usize));
        for row in 0..rect.h {
            for col in 0..rect.w {
                tiles.push(piece.tile_at(col, row));
            }
        }
        Self { rect, piece, tiles }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Tile rendered at `(col, row)` relative to the region's origin.
    pub fn tile(&self, col: u32, row: u32) -> Option<Tile> {
        if col >= self.rect.w || row >= self.rect.h {
            return None;
        }
        self.tiles
            .get((row as usize) * (self.rect.w as usize) + col as usize)
            .copied()
    }

    /// Every cell as `(grid_x, grid_y, tile)` in absolute tileset coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, Tile)> + '_ {
        let w = self.rect.w.max(1);
        self.tiles.iter().enumerate().map(move |(i, t)| {
            let i = i as u32;
            (self.rect.x + i % w, self.rect.y + i / w, *t)
        })
    }
}

/// Free-space bookkeeping for one tileset, in grid units.
///
/// Free rectangles are maximal and may overlap each other; they never overlap
/// a used region. The free list is kept sorted by ascending area (stable), so
/// the first rectangle that fits is the best-area-fit candidate.
#[derive(Debug, Clone)]
pub struct FreeSpaceTileset {
    grid_w: u32,
    grid_h: u32,
    free: Vec<Rect>,
    used: Vec<UsedRegion>,
    sealed: bool,
}

impl FreeSpaceTileset {
    pub fn new(grid_w: u32, grid_h: u32) -> Self {
        let mut free = Vec::with_capacity(1);
        if grid_w > 0 && grid_h > 0 {
            free.push(Rect::new(0, 0, grid_w, grid_h));
        }
        Self {
            grid_w,
            grid_h,
            free,
            used: Vec::new(),
            sealed: false,
        }
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.grid_w, self.grid_h)
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn used_regions(&self) -> &[UsedRegion] {
        &self.used
    }

    pub fn used_cells(&self) -> u64 {
        self.used.iter().map(|u| u.rect.area()).sum()
    }

    pub fn total_cells(&self) -> u64 {
        (self.grid_w as u64) * (self.grid_h as u64)
    }

    pub fn state(&self) -> TilesetState {
        if self.sealed {
            TilesetState::Sealed
        } else if self.free.is_empty() {
            TilesetState::Full
        } else if self.used.is_empty() {
            TilesetState::Empty
        } else {
            TilesetState::Accepting
        }
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Marks the tileset as saved. Returns `false` if it was already sealed.
    pub fn seal(&mut self) -> bool {
        if self.sealed {
            return false;
        }
        self.sealed = true;
        true
    }

    fn find_candidate(&self, w: u32, h: u32) -> Option<usize> {
        self.free.iter().position(|fr| fr.w >= w && fr.h >= h)
    }

    /// True if `try_place` would succeed for a piece of this extent.
    pub fn can_place(&self, piece: &Piece) -> bool {
        !self.sealed
            && piece.width > 0
            && piece.height > 0
            && self.find_candidate(piece.width, piece.height).is_some()
    }

    /// Places `piece` at the origin of the smallest free rectangle that holds it.
    pub fn try_place(&mut self, piece: Piece) -> Option<Rect> {
        if self.sealed || piece.width == 0 || piece.height == 0 {
            return None;
        }
        let idx = self.find_candidate(piece.width, piece.height)?;
        let candidate = self.free.remove(idx);
        let node = Rect::new(candidate.x, candidate.y, piece.width, piece.height);
        // candidate goes back at the tail and is carved like every other overlap
        self.free.push(candidate);
        self.carve(&node);
        self.used.push(UsedRegion::new(node, piece));
        Some(node)
    }

    /// Registers `piece` at a known grid position without searching.
    ///
    /// Returns `false` (and changes nothing) if the tileset is sealed, the
    /// region leaves the grid, or it overlaps an existing used region.
    pub fn occupy(&mut self, x: u32, y: u32, piece: Piece) -> bool {
        if self.sealed || piece.width == 0 || piece.height == 0 {
            return false;
        }
        if x >= self.grid_w
            || y >= self.grid_h
            || piece.width > self.grid_w - x
            || piece.height > self.grid_h - y
        {
            return false;
        }
        let node = Rect::new(x, y, piece.width, piece.height);
        if self.used.iter().any(|u| u.rect.intersects(&node)) {
            return false;
        }
        self.carve(&node);
        self.used.push(UsedRegion::new(node, piece));
        true
    }

    /// Replaces every free rectangle overlapping `node` with its remainders.
    fn carve(&mut self, node: &Rect) {
        let mut remainders: Vec<Rect> = Vec::new();
        let mut kept: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.drain(..) {
            match intersect(node, &fr) {
                Some(overlap) => subtract_into(&mut remainders, &fr, &overlap),
                None => kept.push(fr),
            }
        }
        // exact duplicates of survivors only; contained rectangles are left alone
        let survivors = kept.len();
        for r in remainders {
            if !kept[..survivors].contains(&r) {
                kept.push(r);
            }
        }
        kept.sort_by_key(|r| r.area());
        self.free = kept;
    }
}
