use image::{Rgba, RgbaImage};
use tracing::trace;

use crate::config::RunConfig;
use crate::error::Result;
use crate::packer::FreeSpaceTileset;
use crate::source::{SourceArena, SourceLoader};

/// Sets every pixel of `canvas` to `color`.
pub fn fill(canvas: &mut RgbaImage, color: Rgba<u8>) {
    for px in canvas.pixels_mut() {
        *px = color;
    }
}

fn put_clipped(canvas: &mut RgbaImage, x: i64, y: i64, px: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    if x >= 0 && y >= 0 && x < cw as i64 && y < ch as i64 {
        canvas.put_pixel(x as u32, y as u32, px);
    }
}

fn get_src(src: &RgbaImage, x: u32, y: u32) -> Option<Rgba<u8>> {
    src.get_pixel_checked(x, y).copied()
}

/// Copy the `tw x th` tile at (sx, sy) of `src` into `canvas` at (dx, dy).
///
/// Pixels are copied as-is (no blending); anything outside the canvas or the
/// source is skipped. With `prevent_tearing`, the tile's outermost columns
/// and rows are first duplicated one pixel outward into the gutter. Gutter
/// corners are left untouched.
pub fn blit_tile(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    sx: u32,
    sy: u32,
    tw: u32,
    th: u32,
    dx: u32,
    dy: u32,
    prevent_tearing: bool,
) {
    if tw == 0 || th == 0 {
        return;
    }
    let (dx, dy) = (dx as i64, dy as i64);

    if prevent_tearing {
        let right = sx + tw - 1;
        let bottom = sy + th - 1;
        for yy in 0..th {
            let ty = dy + yy as i64;
            if let Some(p) = get_src(src, sx, sy + yy) {
                put_clipped(canvas, dx - 1, ty, p);
            }
            if let Some(p) = get_src(src, right, sy + yy) {
                put_clipped(canvas, dx + tw as i64, ty, p);
            }
        }
        for xx in 0..tw {
            let tx = dx + xx as i64;
            if let Some(p) = get_src(src, sx + xx, sy) {
                put_clipped(canvas, tx, dy - 1, p);
            }
            if let Some(p) = get_src(src, sx + xx, bottom) {
                put_clipped(canvas, tx, dy + th as i64, p);
            }
        }
    }

    for yy in 0..th {
        for xx in 0..tw {
            if let Some(p) = get_src(src, sx + xx, sy + yy) {
                put_clipped(canvas, dx + xx as i64, dy + yy as i64, p);
            }
        }
    }
}

/// Multiplies the colour channels of every pixel by its alpha.
pub fn premultiply_alpha(canvas: &mut RgbaImage) {
    for px in canvas.pixels_mut() {
        let a = px[3] as u32;
        for c in 0..3 {
            px[c] = ((px[c] as u32 * a + 127) / 255) as u8;
        }
    }
}

/// Renders every used region of `tileset` onto a fresh canvas.
///
/// Source rasters come from `arena` (decoded through `loader` on first use);
/// each region releases its source once drawn.
pub fn render_tileset(
    tileset: &FreeSpaceTileset,
    cfg: &RunConfig,
    arena: &mut SourceArena,
    loader: &mut dyn SourceLoader,
) -> Result<RgbaImage> {
    let mut canvas = RgbaImage::new(cfg.tileset_width, cfg.tileset_height);
    if let Some(bg) = cfg.background {
        fill(&mut canvas, bg);
    }

    for region in tileset.used_regions() {
        let entry = region.piece().entry;
        let src = arena.raster(entry, loader)?;
        for (gx, gy, tile) in region.cells() {
            let (rx, ry) = cfg.render_origin(gx, gy);
            blit_tile(
                src,
                &mut canvas,
                tile.column * cfg.tile_width,
                tile.row * cfg.tile_height,
                cfg.tile_width,
                cfg.tile_height,
                rx,
                ry,
                cfg.prevent_tearing,
            );
        }
        trace!(entry, rect = ?region.rect(), "composited region");
        arena.release(entry);
    }

    if cfg.premultiply_alpha {
        premultiply_alpha(&mut canvas);
    }
    Ok(canvas)
}
