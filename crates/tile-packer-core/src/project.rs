//! Persisted project record: tile/tileset settings plus every source entry and
//! the placements it received on previous runs.
//!
//! Files ending in `.json` are read and written as JSON; anything else as YAML.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::error::{Result, TilePackerError};
use crate::model::{Piece, Rect};

/// Default project file name inside a project directory.
pub const DEFAULT_PROJECT_FILE: &str = "tilepacker.yaml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default = "default_tile_dim")]
    pub tile_width: u32,
    #[serde(default = "default_tile_dim")]
    pub tile_height: u32,
    #[serde(default = "default_tileset_dim")]
    pub tileset_width: u32,
    #[serde(default = "default_tileset_dim")]
    pub tileset_height: u32,
    #[serde(default)]
    pub tile_padding: u32,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Output directory, relative to the project file's directory.
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default)]
    pub prevent_tearing: bool,
    #[serde(default)]
    pub premultiply_alpha: bool,
    /// `"R,G,B"`; transparent canvas when absent.
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub entries: Vec<SourceEntry>,
}

/// One source image and the placements it received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    /// Path relative to the project directory, `/`-separated.
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement: Vec<PlacementRecord>,
}

/// Where one piece of a source ended up.
///
/// `tileset_x`/`tileset_y` are grid coordinates; a negative value marks the
/// record as unplaced. The sub-image fields locate the piece inside its
/// source, in tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    #[serde(default)]
    pub tileset: usize,
    #[serde(default = "unplaced")]
    pub tileset_x: i64,
    #[serde(default = "unplaced")]
    pub tileset_y: i64,
    #[serde(default)]
    pub sub_image_x: u32,
    #[serde(default)]
    pub sub_image_y: u32,
    #[serde(default)]
    pub sub_image_width: u32,
    #[serde(default)]
    pub sub_image_height: u32,
}

fn default_tile_dim() -> u32 {
    32
}
fn default_tileset_dim() -> u32 {
    512
}
fn default_output_format() -> String {
    "PNG".into()
}
fn default_output_path() -> String {
    "./".into()
}
fn unplaced() -> i64 {
    -1
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            tile_width: default_tile_dim(),
            tile_height: default_tile_dim(),
            tileset_width: default_tileset_dim(),
            tileset_height: default_tileset_dim(),
            tile_padding: 0,
            output_format: default_output_format(),
            output_path: default_output_path(),
            prevent_tearing: false,
            premultiply_alpha: false,
            background_color: None,
            entries: Vec::new(),
        }
    }
}

impl PlacementRecord {
    /// Record for `piece` placed at `rect` of tileset `tileset`.
    pub fn placed(tileset: usize, rect: Rect, piece: &Piece) -> Self {
        Self {
            tileset,
            tileset_x: rect.x as i64,
            tileset_y: rect.y as i64,
            sub_image_x: piece.sub_x,
            sub_image_y: piece.sub_y,
            sub_image_width: piece.width,
            sub_image_height: piece.height,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.tileset_x >= 0 && self.tileset_y >= 0
    }

    pub fn area(&self) -> u64 {
        (self.sub_image_width as u64) * (self.sub_image_height as u64)
    }

    /// Grid position, if placed and representable.
    pub fn position(&self) -> Option<(u32, u32)> {
        if !self.is_placed() {
            return None;
        }
        let x = u32::try_from(self.tileset_x).ok()?;
        let y = u32::try_from(self.tileset_y).ok()?;
        Some((x, y))
    }

    /// The piece of source `entry` this record describes.
    pub fn piece(&self, entry: usize) -> Piece {
        Piece {
            entry,
            sub_x: self.sub_image_x,
            sub_y: self.sub_image_y,
            width: self.sub_image_width,
            height: self.sub_image_height,
        }
    }

    /// Order used when writing: placed before unplaced; placed by
    /// `(tileset_x, tileset_y)`; unplaced by `(area, tileset_x, tileset_y)`.
    pub fn persist_order(&self, other: &Self) -> Ordering {
        match (self.is_placed(), other.is_placed()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (true, true) => (self.tileset_x, self.tileset_y).cmp(&(other.tileset_x, other.tileset_y)),
            (false, false) => (self.area(), self.tileset_x, self.tileset_y).cmp(&(
                other.area(),
                other.tileset_x,
                other.tileset_y,
            )),
        }
    }
}

impl SourceEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            placement: Vec::new(),
        }
    }

    /// Placed iff there is at least one record and every record is placed.
    pub fn is_placed(&self) -> bool {
        !self.placement.is_empty() && self.placement.iter().all(PlacementRecord::is_placed)
    }

    /// Order used when writing: placed entries first, then by path.
    pub fn persist_order(&self, other: &Self) -> Ordering {
        match (self.is_placed(), other.is_placed()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.path.cmp(&other.path),
        }
    }
}

impl ProjectConfig {
    /// An empty project with default settings, as written by `tile-packer` without arguments.
    pub fn example() -> Self {
        Self::default()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Discards every placement record so the next run packs from scratch.
    pub fn clear_placements(&mut self) {
        for entry in &mut self.entries {
            entry.placement.clear();
        }
    }

    /// Sorts entries and their records into the stable on-disk order.
    pub fn sort_for_persist(&mut self) {
        for entry in &mut self.entries {
            entry.placement.sort_by(|a, b| a.persist_order(b));
        }
        self.entries.sort_by(|a, b| a.persist_order(b));
    }

    pub fn from_yaml_str(s: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_json_str(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_yaml_string(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn to_json_string(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads a project file (JSON when the extension is `.json`, YAML otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let read_err = |message: String| TilePackerError::ConfigRead {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        if is_json(path) {
            Self::from_json_str(&text).map_err(|e| read_err(e.to_string()))
        } else {
            Self::from_yaml_str(&text).map_err(|e| read_err(e.to_string()))
        }
    }

    /// Writes the project file in persisted order; `self` is left untouched.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |message: String| TilePackerError::ConfigWrite {
            path: path.to_path_buf(),
            message,
        };
        let mut sorted = self.clone();
        sorted.sort_for_persist();
        let text = if is_json(path) {
            sorted.to_json_string().map_err(|e| write_err(e.to_string()))?
        } else {
            sorted.to_yaml_string().map_err(|e| write_err(e.to_string()))?
        };
        fs::write(path, text).map_err(|e| write_err(e.to_string()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
