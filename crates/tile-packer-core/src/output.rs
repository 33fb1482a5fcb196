//! Tileset encoding and destinations.

use image::{DynamicImage, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::error::Result;

/// Receives each finished tileset exactly once, in the order they are sealed.
pub trait TilesetSink {
    fn write_tileset(&mut self, index: usize, image: RgbaImage) -> Result<()>;
}

/// Encodes a canvas in `format`. JPEG drops the alpha channel.
pub fn encode_tileset(image: RgbaImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let dynamic = match format {
        OutputFormat::Png => DynamicImage::ImageRgba8(image),
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
    };
    dynamic.write_to(&mut Cursor::new(&mut buf), format.image_format())?;
    Ok(buf)
}

/// File name of tileset `index`: `<index>.<ext>`.
pub fn tileset_file_name(index: usize, format: OutputFormat) -> String {
    format!("{index}.{}", format.extension())
}

/// Writes `<index>.<ext>` files into a directory, creating it on first write.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl TilesetSink for DirectorySink {
    fn write_tileset(&mut self, index: usize, image: RgbaImage) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(tileset_file_name(index, self.format));
        let bytes = encode_tileset(image, self.format)?;
        fs::write(&path, bytes)?;
        self.written.push(path);
        Ok(())
    }
}

/// Keeps rendered tilesets in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub tilesets: Vec<(usize, RgbaImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&RgbaImage> {
        self.tilesets
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, img)| img)
    }
}

impl TilesetSink for MemorySink {
    fn write_tileset(&mut self, index: usize, image: RgbaImage) -> Result<()> {
        self.tilesets.push((index, image));
        Ok(())
    }
}
