use image::Rgba;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, TilePackerError};
use crate::project::ProjectConfig;

/// Raster format of the written tilesets (and of the accepted sources).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// File extension used for written tilesets.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Whether a source path carries an extension of this format.
    pub fn matches_path(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        match self {
            Self::Png => lower.ends_with(".png"),
            Self::Jpeg => lower.ends_with(".jpg") || lower.ends_with(".jpeg"),
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TilePackerError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(TilePackerError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parses an `"R,G,B"` string into an opaque colour.
pub fn parse_background_color(s: &str) -> Result<Rgba<u8>> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(TilePackerError::InvalidBackgroundColor(s.to_string()));
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(parts) {
        *slot = part
            .trim()
            .parse::<u8>()
            .map_err(|_| TilePackerError::InvalidBackgroundColor(s.to_string()))?;
    }
    Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Immutable settings for one packing run.
///
/// Built once from the project file (see [`RunConfig::from_project`]) and
/// passed by reference to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Gutter pixels on every side of each tile.
    pub padding: u32,
    /// Tileset canvas width in pixels.
    pub tileset_width: u32,
    /// Tileset canvas height in pixels.
    pub tileset_height: u32,
    pub format: OutputFormat,
    /// Fill colour for the whole canvas before tiles are drawn.
    pub background: Option<Rgba<u8>>,
    /// Duplicate each tile's edge pixels into its gutter.
    pub prevent_tearing: bool,
    /// Multiply colour channels by alpha before encoding.
    pub premultiply_alpha: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tile_width: 32,
            tile_height: 32,
            padding: 0,
            tileset_width: 512,
            tileset_height: 512,
            format: OutputFormat::Png,
            background: None,
            prevent_tearing: false,
            premultiply_alpha: false,
        }
    }
}

impl RunConfig {
    /// Derives and validates run settings from a project record.
    pub fn from_project(project: &ProjectConfig) -> Result<Self> {
        let format: OutputFormat = project.output_format.parse()?;
        let background = match project.background_color.as_deref() {
            Some(s) => Some(parse_background_color(s)?),
            None => None,
        };
        let cfg = Self {
            tile_width: project.tile_width,
            tile_height: project.tile_height,
            padding: project.tile_padding,
            tileset_width: project.tileset_width,
            tileset_height: project.tileset_height,
            format,
            background,
            prevent_tearing: project.prevent_tearing,
            premultiply_alpha: project.premultiply_alpha,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - tile dimensions are zero
    /// - a tileset cannot hold a single padded tile on either axis
    /// - tearing prevention is enabled without padding
    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(TilePackerError::InvalidConfig(format!(
                "tile size must be non-zero (got {}x{})",
                self.tile_width, self.tile_height
            )));
        }
        if self.grid_width() == 0 || self.grid_height() == 0 {
            return Err(TilePackerError::InvalidConfig(format!(
                "tileset {}x{} cannot hold a single {}x{} tile with padding {}",
                self.tileset_width,
                self.tileset_height,
                self.tile_width,
                self.tile_height,
                self.padding
            )));
        }
        if self.prevent_tearing && self.padding < 1 {
            return Err(TilePackerError::InvalidTearingConfig {
                padding: self.padding,
            });
        }
        Ok(())
    }

    /// Width of one grid cell in pixels (tile plus gutter on both sides).
    pub fn cell_width(&self) -> u32 {
        self.tile_width
            .saturating_add(self.padding.saturating_mul(2))
    }

    /// Height of one grid cell in pixels (tile plus gutter on both sides).
    pub fn cell_height(&self) -> u32 {
        self.tile_height
            .saturating_add(self.padding.saturating_mul(2))
    }

    /// Maximum tileset width in tiles.
    pub fn grid_width(&self) -> u32 {
        match self.cell_width() {
            0 => 0,
            cw => self.tileset_width / cw,
        }
    }

    /// Maximum tileset height in tiles.
    pub fn grid_height(&self) -> u32 {
        match self.cell_height() {
            0 => 0,
            ch => self.tileset_height / ch,
        }
    }

    /// Pixel position of the tile drawn at grid cell `(gx, gy)`.
    pub fn render_origin(&self, gx: u32, gy: u32) -> (u32, u32) {
        (
            gx * self.cell_width() + self.padding,
            gy * self.cell_height() + self.padding,
        )
    }
}

/// Builder for `RunConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct RunConfigBuilder {
    cfg: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: RunConfig::default(),
        }
    }
    pub fn tile_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.tile_width = w;
        self.cfg.tile_height = h;
        self
    }
    pub fn tileset_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.tileset_width = w;
        self.cfg.tileset_height = h;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn format(mut self, v: OutputFormat) -> Self {
        self.cfg.format = v;
        self
    }
    pub fn background(mut self, v: Option<Rgba<u8>>) -> Self {
        self.cfg.background = v;
        self
    }
    pub fn prevent_tearing(mut self, v: bool) -> Self {
        self.cfg.prevent_tearing = v;
        self
    }
    pub fn premultiply_alpha(mut self, v: bool) -> Self {
        self.cfg.premultiply_alpha = v;
        self
    }
    pub fn build(self) -> RunConfig {
        self.cfg
    }
}

impl RunConfig {
    /// Create a fluent builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }
}
