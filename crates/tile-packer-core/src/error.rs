use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TilePackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Error reading config file {}: {message}", path.display())]
    ConfigRead { path: PathBuf, message: String },
    #[error("Error storing placement config {}: {message}", path.display())]
    ConfigWrite { path: PathBuf, message: String },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Unsupported output format: {0} (expected PNG, JPG or JPEG)")]
    UnsupportedFormat(String),
    #[error("{} does not exist", .0.display())]
    MissingSourceFile(PathBuf),
    #[error("{path} does not match format {format}")]
    FormatMismatch { path: String, format: String },
    #[error("Background color must be in format R,G,B (got {0:?})")]
    InvalidBackgroundColor(String),
    #[error("If tearing prevention is enabled, the tile padding must be greater than 0 (got {padding})")]
    InvalidTearingConfig { padding: u32 },
    #[error("{path} is {width}x{height} pixels, smaller than a single tile")]
    InvalidSourceSize {
        path: String,
        width: u32,
        height: u32,
    },
    #[error("Recorded placement of {path} at tileset {tileset} ({x},{y}) conflicts with the tileset grid")]
    PlacementConflict {
        path: String,
        tileset: usize,
        x: u32,
        y: u32,
    },
    #[error("Tile image too large: {path} needs {width}x{height} tiles")]
    ImageTooLarge {
        path: String,
        width: u32,
        height: u32,
    },
}

pub type Result<T> = std::result::Result<T, TilePackerError>;
