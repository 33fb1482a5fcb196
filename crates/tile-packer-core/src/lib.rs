//! Core library for packing fixed-size tiles into tilesets.
//!
//! - Packing: best-area-fit over maximal free rectangles, per tileset, in grid units
//! - Splitting: sources larger than a tileset are halved until every piece fits
//! - Replay: placements recorded in the project file are restored exactly on the next run
//! - Rendering: tiles are copied into padded grid cells, with optional edge
//!   duplication against texture bleeding, background fill and premultiplied alpha
//!
//! Quick example:
//! ```ignore
//! use std::path::Path;
//! use tile_packer_core::{DirectorySink, FsSourceLoader, ProjectConfig, RunConfig, pack_project};
//! # fn main() -> anyhow::Result<()> {
//! let project = ProjectConfig::load(Path::new("tiles/tilepacker.yaml"))?;
//! let cfg = RunConfig::from_project(&project)?;
//! let mut loader = FsSourceLoader::new("tiles");
//! let mut sink = DirectorySink::new(Path::new("tiles").join(&project.output_path), cfg.format);
//! let out = pack_project(&project, &mut loader, &mut sink)?;
//! out.project.save(Path::new("tiles/tilepacker.yaml"))?;
//! println!("{}", out.summary.summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod packer;
pub mod pipeline;
pub mod project;
pub mod source;

pub use config::*;
pub use error::*;
pub use model::*;
pub use output::*;
pub use packer::*;
pub use pipeline::*;
pub use project::*;
pub use source::*;

/// Convenience prelude for common types and functions.
/// Importing `tile_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{OutputFormat, RunConfig, RunConfigBuilder, parse_background_color};
    pub use crate::error::{Result, TilePackerError};
    pub use crate::model::{PackSummary, Piece, Rect, Tile};
    pub use crate::output::{DirectorySink, MemorySink, TilesetSink};
    pub use crate::packer::{FreeSpaceTileset, TilesetState};
    pub use crate::pipeline::{MAX_TILESETS, PackOutcome, pack_project};
    pub use crate::project::{PlacementRecord, ProjectConfig, SourceEntry};
    pub use crate::source::{FsSourceLoader, MemorySourceLoader, SourceArena, SourceLoader};
}
