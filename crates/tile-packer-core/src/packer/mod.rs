//! Grid-space packing: rectangle algebra, per-tileset free-space bookkeeping
//! and the splitter that normalises oversized sources.

pub mod algebra;
pub mod splitter;
pub mod tileset;

pub use algebra::{intersect, subtract};
pub use splitter::normalize;
pub use tileset::{FreeSpaceTileset, TilesetState, UsedRegion};
