use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

use crate::compositing::render_tileset;
use crate::config::RunConfig;
use crate::error::{Result, TilePackerError};
use crate::model::{PackSummary, Piece, Rect};
use crate::output::TilesetSink;
use crate::packer::{FreeSpaceTileset, normalize};
use crate::project::{PlacementRecord, ProjectConfig};
use crate::source::{SourceArena, SourceLoader};

/// Highest tileset count a recorded placement may point into.
pub const MAX_TILESETS: usize = 4096;

/// Result of a packing run: the project with refreshed placement records
/// (in persisted order) and run statistics.
#[derive(Debug, Clone)]
pub struct PackOutcome {
    pub project: ProjectConfig,
    pub summary: PackSummary,
}

/// Mutable state of one run, borrowed by every step.
struct Packing<'a> {
    cfg: RunConfig,
    tilesets: Vec<FreeSpaceTileset>,
    arena: SourceArena,
    loader: &'a mut dyn SourceLoader,
    sink: &'a mut dyn TilesetSink,
    summary: PackSummary,
}

impl Packing<'_> {
    fn new_tileset(&self) -> FreeSpaceTileset {
        FreeSpaceTileset::new(self.cfg.grid_width(), self.cfg.grid_height())
    }

    fn ensure_tileset(&mut self, index: usize) {
        while self.tilesets.len() <= index {
            let ts = self.new_tileset();
            self.tilesets.push(ts);
        }
    }

    fn save(&mut self, index: usize) -> Result<()> {
        let Some(tileset) = self.tilesets.get_mut(index) else {
            return Ok(());
        };
        seal_and_save(
            index,
            tileset,
            &self.cfg,
            &mut self.arena,
            &mut *self.loader,
            &mut *self.sink,
        )
    }

    /// First fit over existing tilesets in index order, then a fresh one.
    fn place(&mut self, piece: Piece) -> Option<(usize, Rect)> {
        for (i, ts) in self.tilesets.iter_mut().enumerate() {
            if let Some(rect) = ts.try_place(piece) {
                return Some((i, rect));
            }
        }
        let mut ts = self.new_tileset();
        let rect = ts.try_place(piece)?;
        self.tilesets.push(ts);
        Some((self.tilesets.len() - 1, rect))
    }
}

/// Seals `tileset`, renders it and hands it to `sink`.
///
/// Does nothing if the tileset was already sealed, so every tileset is
/// written at most once.
pub fn seal_and_save(
    index: usize,
    tileset: &mut FreeSpaceTileset,
    cfg: &RunConfig,
    arena: &mut SourceArena,
    loader: &mut dyn SourceLoader,
    sink: &mut dyn TilesetSink,
) -> Result<()> {
    if !tileset.seal() {
        return Ok(());
    }
    let image = render_tileset(tileset, cfg, arena, loader)?;
    sink.write_tileset(index, image)?;
    info!(
        tileset = index,
        regions = tileset.used_regions().len(),
        used = tileset.used_cells(),
        "saved tileset"
    );
    Ok(())
}

/// Grid extent of a source, in whole tiles.
fn grid_extent(path: &str, w: u32, h: u32, cfg: &RunConfig) -> Result<(u32, u32)> {
    let (gw, gh) = (w / cfg.tile_width, h / cfg.tile_height);
    if gw == 0 || gh == 0 {
        return Err(TilePackerError::InvalidSourceSize {
            path: path.to_string(),
            width: w,
            height: h,
        });
    }
    if w % cfg.tile_width != 0 || h % cfg.tile_height != 0 {
        warn!(
            path,
            width = w,
            height = h,
            "source is not a multiple of the tile size; trailing pixels are ignored"
        );
    }
    Ok((gw, gh))
}

/// Packs every entry of `project` into tilesets and writes them to `sink`.
///
/// Entries whose records are all placed are replayed at their recorded grid
/// positions; every other entry is split to the tileset grid and placed
/// first-fit across tilesets in index order. A tileset is rendered and
/// written as soon as it fills up; the rest are written at the end.
///
/// Errors abort the run. Tilesets written before the error stay written;
/// `project` itself is never modified.
#[instrument(skip_all)]
pub fn pack_project(
    project: &ProjectConfig,
    loader: &mut dyn SourceLoader,
    sink: &mut dyn TilesetSink,
) -> Result<PackOutcome> {
    let cfg = RunConfig::from_project(project)?;
    let mut project = project.clone();

    let mut extents = Vec::with_capacity(project.entries.len());
    for entry in &project.entries {
        if !cfg.format.matches_path(&entry.path) {
            return Err(TilePackerError::FormatMismatch {
                path: entry.path.clone(),
                format: project.output_format.clone(),
            });
        }
        let (w, h) = loader.dimensions(&entry.path)?;
        extents.push(grid_extent(&entry.path, w, h, &cfg)?);
    }

    let mut run = Packing {
        arena: SourceArena::new(project.entries.iter().map(|e| e.path.clone())),
        tilesets: Vec::new(),
        loader,
        sink,
        summary: PackSummary::default(),
        cfg,
    };

    // replay
    for (idx, entry) in project.entries.iter_mut().enumerate() {
        if !entry.is_placed() {
            continue;
        }
        for _ in &entry.placement {
            run.arena.retain(idx);
        }
        for rec in std::mem::take(&mut entry.placement) {
            let (x, y) = rec.position().ok_or_else(|| TilePackerError::PlacementConflict {
                path: entry.path.clone(),
                tileset: rec.tileset,
                x: 0,
                y: 0,
            })?;
            let occupied = rec.tileset < MAX_TILESETS && {
                run.ensure_tileset(rec.tileset);
                run.tilesets[rec.tileset].occupy(x, y, rec.piece(idx))
            };
            if !occupied {
                return Err(TilePackerError::PlacementConflict {
                    path: entry.path.clone(),
                    tileset: rec.tileset,
                    x,
                    y,
                });
            }
            debug!(path = %entry.path, tileset = rec.tileset, x, y, "replayed placement");
            run.summary.num_replayed += 1;
            entry.placement.push(rec);
            if run.tilesets[rec.tileset].is_full() {
                run.save(rec.tileset)?;
            }
        }
    }

    // normalise the rest
    let (max_w, max_h) = (run.cfg.grid_width(), run.cfg.grid_height());
    let mut queue: VecDeque<Piece> = VecDeque::new();
    for (idx, entry) in project.entries.iter_mut().enumerate() {
        if entry.is_placed() {
            continue;
        }
        entry.placement.clear();
        let (gw, gh) = extents[idx];
        let parts = normalize(Piece::whole(idx, gw, gh), max_w, max_h);
        if parts.len() > 1 {
            debug!(path = %entry.path, parts = parts.len(), "split oversized source");
            run.summary.num_split_sources += 1;
        }
        for _ in &parts {
            run.arena.retain(idx);
        }
        queue.extend(parts);
    }

    while let Some(piece) = queue.pop_front() {
        let entry = &mut project.entries[piece.entry];
        let (index, rect) = run.place(piece).ok_or_else(|| TilePackerError::ImageTooLarge {
            path: entry.path.clone(),
            width: piece.width,
            height: piece.height,
        })?;
        info!(path = %entry.path, tileset = index, x = rect.x, y = rect.y, "placed");
        entry.placement.push(PlacementRecord::placed(index, rect, &piece));
        run.summary.num_placed += 1;
        if run.tilesets[index].is_full() {
            run.save(index)?;
        }
    }

    for index in 0..run.tilesets.len() {
        run.save(index)?;
    }

    run.summary.num_tilesets = run.tilesets.len();
    run.summary.used_cells = run.tilesets.iter().map(|t| t.used_cells()).sum();
    run.summary.total_cells = run.tilesets.iter().map(|t| t.total_cells()).sum();

    project.sort_for_persist();
    Ok(PackOutcome {
        project,
        summary: run.summary,
    })
}
