//! Sprite sheet slicing: cut one image into a grid of equally sized cells.
//!
//! Only the image dimensions are read; pixels stay with the renderer.
//! Cells are numbered row-major starting at the offset corner, with optional
//! spacing between neighbouring cells.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::SheetError;

/// Cell size proposed for a fresh import
pub const DEFAULT_CELL_SIZE: (u32, u32) = (32, 32);
/// Base name proposed for a fresh import
pub const DEFAULT_BASE_NAME: &str = "sprite";

static BASE_NAME_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_()]*$"));

/// Whether `name` only uses characters allowed in cell names.
pub fn is_valid_base_name(name: &str) -> bool {
    BASE_NAME_RE.as_ref().is_ok_and(|re| re.is_match(name))
}

/// One cell rectangle in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    pub path: PathBuf,
    pub base_name: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub spacing_x: u32,
    pub spacing_y: u32,
    /// Image size in pixels
    pub width: u32,
    pub height: u32,
}

impl SpriteSheet {
    /// Sheet over an image of known size.
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, cell: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            base_name: DEFAULT_BASE_NAME.to_string(),
            frame_width: cell.0,
            frame_height: cell.1,
            offset_x: 0,
            offset_y: 0,
            spacing_x: 0,
            spacing_y: 0,
            width,
            height,
        }
    }

    /// Read the image size from disk (header only where the format allows).
    pub fn open(path: &Path, cell: (u32, u32)) -> Result<Self, SheetError> {
        let (width, height) = image::image_dimensions(path)?;
        debug!("SpriteSheet: {} is {}x{}", path.display(), width, height);
        Ok(Self::new(path, width, height, cell))
    }

    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_spacing(mut self, x: u32, y: u32) -> Self {
        self.spacing_x = x;
        self.spacing_y = y;
        self
    }

    pub fn with_base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }

    /// Check the settings before any cell is produced.
    pub fn validate(&self) -> Result<(), SheetError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(SheetError::InvalidFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if self.offset_x >= self.width || self.offset_y >= self.height {
            return Err(SheetError::OffsetOutOfBounds {
                x: self.offset_x,
                y: self.offset_y,
                width: self.width,
                height: self.height,
            });
        }
        let span_w = self.width - self.offset_x + self.spacing_x;
        let span_h = self.height - self.offset_y + self.spacing_y;
        if span_w % (self.frame_width + self.spacing_x) != 0
            || span_h % (self.frame_height + self.spacing_y) != 0
        {
            return Err(SheetError::NotDivisible {
                image_width: self.width,
                image_height: self.height,
                frame_width: self.frame_width,
                frame_height: self.frame_height,
            });
        }
        if !is_valid_base_name(&self.base_name) {
            return Err(SheetError::InvalidBaseName(self.base_name.clone()));
        }
        Ok(())
    }

    /// (columns, rows) of whole cells that fit. Zero for a zero cell size.
    pub fn grid(&self) -> (u32, u32) {
        if self.frame_width == 0 || self.frame_height == 0 {
            return (0, 0);
        }
        let avail_w = self.width.saturating_sub(self.offset_x) + self.spacing_x;
        let avail_h = self.height.saturating_sub(self.offset_y) + self.spacing_y;
        (
            avail_w / (self.frame_width + self.spacing_x),
            avail_h / (self.frame_height + self.spacing_y),
        )
    }

    pub fn cell_count(&self) -> usize {
        let (cols, rows) = self.grid();
        cols as usize * rows as usize
    }

    /// All cells, row-major.
    pub fn cells(&self) -> Vec<Cell> {
        let (cols, rows) = self.grid();
        let step_x = self.frame_width + self.spacing_x;
        let step_y = self.frame_height + self.spacing_y;
        let mut cells = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Cell {
                    index: cells.len(),
                    x: self.offset_x + col * step_x,
                    y: self.offset_y + row * step_y,
                    width: self.frame_width,
                    height: self.frame_height,
                });
            }
        }
        cells
    }

    pub fn cell_name(&self, index: usize) -> String {
        format!("{}_{}", self.base_name, index)
    }
}
