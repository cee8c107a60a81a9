// src/scheduler/view.rs
//! Writable views of a single claimed tile.
//!
//! A tile is not contiguous in the row-major buffer (each of its rows sits one
//! stride apart), so it cannot be a plain `&mut [u32]`. `TileView` holds the
//! buffer base pointer and the tile rectangle and only ever hands out row
//! slices clipped to that rectangle. Views are created by the claim loop, one
//! per claimed index, and dropped before the next claim; since the claim
//! counter never returns the same index twice within a frame, no two live
//! views overlap.

use crate::tiles::TileRect;
use std::marker::PhantomData;

/// Buffer base pointer that can cross into worker threads.
///
/// Safety: the orchestrator holds `&mut FrameBuffer` for the whole frame and
/// the pool barrier guarantees no worker touches the pointer after the frame.
#[derive(Copy, Clone)]
pub(crate) struct FramePtr {
    base: *mut u32,
    stride: usize,
    len: usize,
}

unsafe impl Send for FramePtr {}
unsafe impl Sync for FramePtr {}

impl FramePtr {
    pub(crate) fn new(base: *mut u32, stride: usize, len: usize) -> Self {
        Self { base, stride, len }
    }
}

/// Exclusive, bounds-checked access to the pixels of one tile.
pub struct TileView<'a> {
    frame: FramePtr,
    rect: TileRect,
    _pixels: PhantomData<&'a mut [u32]>,
}

impl<'a> TileView<'a> {
    /// # Safety
    /// `rect` must lie inside the buffer behind `frame`, and no other live
    /// view or reference may cover any pixel of `rect` for `'a`.
    pub(crate) unsafe fn new(frame: FramePtr, rect: TileRect) -> Self {
        debug_assert!(rect.x1 as usize <= frame.stride);
        debug_assert!(rect.y1 as usize * frame.stride <= frame.len);
        Self {
            frame,
            rect,
            _pixels: PhantomData,
        }
    }

    /// Tile region in buffer coordinates.
    pub fn rect(&self) -> TileRect {
        self.rect
    }

    pub fn width(&self) -> u32 {
        self.rect.width()
    }

    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    /// Row `local_y` of the tile (0 is the tile's top row).
    ///
    /// # Panics
    /// Panics if `local_y >= self.height()`.
    pub fn row_mut(&mut self, local_y: u32) -> &mut [u32] {
        assert!(
            local_y < self.height(),
            "row {} outside tile of height {}",
            local_y,
            self.height()
        );
        // SAFETY: the row lies inside this view's rectangle, which the
        // constructor contract makes exclusive to us; the borrow of self keeps
        // the slice from outliving or aliasing another row borrow.
        unsafe { self.row_unchecked(local_y) }
    }

    /// Iterate the tile's rows top to bottom, with their buffer `y`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (u32, &mut [u32])> + '_ {
        let frame = self.frame;
        let rect = self.rect;
        (rect.y0..rect.y1).map(move |y| {
            let start = y as usize * frame.stride + rect.x0 as usize;
            // SAFETY: each iteration yields a distinct row of the rectangle.
            let row = unsafe {
                std::slice::from_raw_parts_mut(frame.base.add(start), rect.width() as usize)
            };
            (y, row)
        })
    }

    /// Write one pixel in tile-local coordinates.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the tile.
    pub fn put(&mut self, local_x: u32, local_y: u32, value: u32) {
        let row = self.row_mut(local_y);
        row[local_x as usize] = value;
    }

    /// Set every pixel of the tile to `value`.
    pub fn fill(&mut self, value: u32) {
        for (_, row) in self.rows_mut() {
            row.fill(value);
        }
    }

    unsafe fn row_unchecked(&mut self, local_y: u32) -> &mut [u32] {
        let y = (self.rect.y0 + local_y) as usize;
        let start = y * self.frame.stride + self.rect.x0 as usize;
        std::slice::from_raw_parts_mut(self.frame.base.add(start), self.rect.width() as usize)
    }
}
