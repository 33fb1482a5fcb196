//! Source raster access.
//!
//! A [`SourceLoader`] resolves entry paths and decodes rasters; the
//! [`SourceArena`] owns decoded rasters per entry and drops each one once the
//! last piece referencing it has been composited.

use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{Result, TilePackerError};

/// Reads source rasters by their project-relative path.
pub trait SourceLoader {
    /// Pixel size of the source without decoding the whole raster.
    fn dimensions(&mut self, path: &str) -> Result<(u32, u32)>;
    /// Decodes the source into RGBA8.
    fn load(&mut self, path: &str) -> Result<RgbaImage>;
}

/// Loads sources from files below a project directory.
#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    root: PathBuf,
}

impl FsSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(TilePackerError::MissingSourceFile(full));
        }
        Ok(full)
    }
}

impl SourceLoader for FsSourceLoader {
    fn dimensions(&mut self, path: &str) -> Result<(u32, u32)> {
        let full = self.resolve(path)?;
        Ok(image::image_dimensions(&full)?)
    }

    fn load(&mut self, path: &str) -> Result<RgbaImage> {
        let full = self.resolve(path)?;
        trace!(path = %full.display(), "decoding source");
        Ok(image::open(&full)?.to_rgba8())
    }
}

/// In-memory sources keyed by path. Counts decodes per path.
#[derive(Debug, Default, Clone)]
pub struct MemorySourceLoader {
    images: HashMap<String, RgbaImage>,
    loads: HashMap<String, usize>,
}

impl MemorySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, image: RgbaImage) {
        self.images.insert(path.into(), image);
    }

    pub fn remove(&mut self, path: &str) -> Option<RgbaImage> {
        self.images.remove(path)
    }

    /// How many times `path` was decoded.
    pub fn load_count(&self, path: &str) -> usize {
        self.loads.get(path).copied().unwrap_or(0)
    }

    fn get(&self, path: &str) -> Result<&RgbaImage> {
        self.images
            .get(path)
            .ok_or_else(|| TilePackerError::MissingSourceFile(PathBuf::from(path)))
    }
}

impl SourceLoader for MemorySourceLoader {
    fn dimensions(&mut self, path: &str) -> Result<(u32, u32)> {
        Ok(self.get(path)?.dimensions())
    }

    fn load(&mut self, path: &str) -> Result<RgbaImage> {
        let image = self.get(path)?.clone();
        *self.loads.entry(path.to_string()).or_default() += 1;
        Ok(image)
    }
}

#[derive(Debug, Default)]
struct Slot {
    path: String,
    raster: Option<RgbaImage>,
    outstanding: usize,
}

/// Decoded rasters owned per entry, with a count of pieces still waiting to
/// be composited.
///
/// Pieces only carry the entry index. A raster is decoded the first time
/// [`SourceArena::raster`] is called for its entry and dropped when
/// [`SourceArena::release`] brings the outstanding count to zero.
#[derive(Debug, Default)]
pub struct SourceArena {
    slots: Vec<Slot>,
}

impl SourceArena {
    /// One slot per entry path, in entry order.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: paths
                .into_iter()
                .map(|p| Slot {
                    path: p.into(),
                    ..Slot::default()
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers one more piece of `entry` awaiting composition.
    pub fn retain(&mut self, entry: usize) {
        if let Some(slot) = self.slots.get_mut(entry) {
            slot.outstanding += 1;
        }
    }

    pub fn outstanding(&self, entry: usize) -> usize {
        self.slots.get(entry).map_or(0, |s| s.outstanding)
    }

    pub fn is_loaded(&self, entry: usize) -> bool {
        self.slots.get(entry).is_some_and(|s| s.raster.is_some())
    }

    /// The decoded raster of `entry`, decoding it on first use.
    pub fn raster(&mut self, entry: usize, loader: &mut dyn SourceLoader) -> Result<&RgbaImage> {
        let slot = self.slots.get_mut(entry).ok_or_else(|| {
            TilePackerError::InvalidConfig(format!("no source entry with index {entry}"))
        })?;
        if slot.raster.is_none() {
            slot.raster = Some(loader.load(&slot.path)?);
        }
        slot.raster.as_ref().ok_or_else(|| {
            TilePackerError::InvalidConfig(format!("source {} was not decoded", slot.path))
        })
    }

    /// Marks one piece of `entry` as composited; frees the raster at zero.
    pub fn release(&mut self, entry: usize) {
        if let Some(slot) = self.slots.get_mut(entry) {
            slot.outstanding = slot.outstanding.saturating_sub(1);
            if slot.outstanding == 0 && slot.raster.take().is_some() {
                trace!(path = %slot.path, "released source");
            }
        }
    }
}
