// src/scheduler/shader.rs
//! Per-tile work functions.

use crate::scheduler::view::TileView;

/// Placeholder fill value used by the default shader.
pub const PLACEHOLDER_FILL: u32 = 0xC0DE_C0DE;

/// Per-frame values every tile invocation sees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInfo {
    /// Zero-based frame counter.
    pub index: u64,
    /// Seconds since the clock started.
    pub time: f64,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// Fills one tile. Must write every pixel of the view exactly once; the view
/// itself makes it impossible to write outside the tile.
///
/// Called concurrently from every worker, so implementations are `Sync` and
/// take `&self`.
pub trait TileShader: Send + Sync {
    fn shade(&self, tile: &mut TileView<'_>, frame: &FrameInfo);
}

impl<F> TileShader for F
where
    F: Fn(&mut TileView<'_>, &FrameInfo) + Send + Sync,
{
    fn shade(&self, tile: &mut TileView<'_>, frame: &FrameInfo) {
        self(tile, frame)
    }
}

/// Constant fill.
#[derive(Debug, Clone, Copy)]
pub struct SolidFill(pub u32);

impl Default for SolidFill {
    fn default() -> Self {
        SolidFill(PLACEHOLDER_FILL)
    }
}

impl TileShader for SolidFill {
    fn shade(&self, tile: &mut TileView<'_>, _frame: &FrameInfo) {
        tile.fill(self.0);
    }
}

/// Writes the low 32 bits of the frame index into every pixel, so a finished
/// frame can be checked for stale or missing tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationStamp;

impl TileShader for GenerationStamp {
    fn shade(&self, tile: &mut TileView<'_>, frame: &FrameInfo) {
        tile.fill(frame.index as u32);
    }
}

/// Animated gradient over the whole buffer; a visible stand-in for a real
/// renderer.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    pub width: u32,
    pub height: u32,
}

impl TileShader for Gradient {
    fn shade(&self, tile: &mut TileView<'_>, frame: &FrameInfo) {
        let phase = (frame.time * 64.0) as u32;
        let x0 = tile.rect().x0;
        for (y, row) in tile.rows_mut() {
            let g = (y * 255 / self.height.max(1)) & 0xff;
            for (dx, px) in row.iter_mut().enumerate() {
                let x = x0 + dx as u32;
                let r = ((x * 255 / self.width.max(1)) + phase) & 0xff;
                let b = (r ^ g) & 0xff;
                *px = 0xff00_0000 | (r << 16) | (g << 8) | b;
            }
        }
    }
}
