// src/tiles/mod.rs
//! Tile grid geometry: splits a fixed resolution into square tiles.
//!
//! The grid is never stored as a list of rectangles. A tile index is mapped to
//! its pixel region on demand by [`TileGrid::region_of`], which is what the
//! claim loop calls after it has range-checked the index.
//!
//! ```text
//!   index:   0    1    2  ...  cx-1
//!           cx  cx+1 ...
//!           ...
//! region_of(i) = ((i % cx) * ts, (i / cx) * ts) .. + ts
//! ```

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Fixed output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in a buffer of this resolution.
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    pub const fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub const fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub const fn overlaps(&self, other: &TileRect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// Derived tile layout for one resolution and tile edge length.
///
/// Construction checks that both dimensions divide evenly by the tile size;
/// after that every index below [`TileGrid::tile_count`] maps to a full tile
/// and the tiles cover the buffer with no overlap and no gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    resolution: Resolution,
    tile_size: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl TileGrid {
    pub fn new(resolution: Resolution, tile_size: u32) -> Result<Self> {
        ensure!(tile_size > 0, "tile size must be non-zero");
        ensure!(
            resolution.width > 0 && resolution.height > 0,
            "resolution {}x{} must be non-zero",
            resolution.width,
            resolution.height
        );
        ensure!(
            resolution.width % tile_size == 0 && resolution.height % tile_size == 0,
            "resolution {}x{} is not divisible by tile size {}",
            resolution.width,
            resolution.height,
            tile_size
        );

        let tiles_x = resolution.width / tile_size;
        let tiles_y = resolution.height / tile_size;
        ensure!(
            tiles_x.checked_mul(tiles_y).is_some(),
            "tile count {}x{} overflows u32",
            tiles_x,
            tiles_y
        );

        Ok(Self {
            resolution,
            tile_size,
            tiles_x,
            tiles_y,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    pub fn tile_count(&self) -> u32 {
        self.tiles_x * self.tiles_y
    }

    /// Pixel region of tile `index`.
    ///
    /// Only meaningful for `index < self.tile_count()`; the claim loop checks
    /// the bound before calling, so no check happens here.
    #[inline(always)]
    pub fn region_of(&self, index: u32) -> TileRect {
        let x0 = (index % self.tiles_x) * self.tile_size;
        let y0 = (index / self.tiles_x) * self.tile_size;
        TileRect {
            x0,
            y0,
            x1: x0 + self.tile_size,
            y1: y0 + self.tile_size,
        }
    }

    /// All tile regions in index order.
    pub fn regions(&self) -> impl Iterator<Item = TileRect> + '_ {
        (0..self.tile_count()).map(move |i| self.region_of(i))
    }
}
