// src/framebuffer.rs
//! The pixel buffer the orchestrator renders into.
//!
//! One `FrameBuffer` is allocated at startup and lives as long as the
//! orchestrator. It is never resized: workers receive views into it computed
//! from the fixed resolution, so reallocation while a frame is in flight would
//! invalidate every view.

use crate::tiles::Resolution;

/// Bytes per pixel of the packed 32-bit format.
pub const BYTES_PER_PIXEL: usize = 4;

/// Row-major buffer of packed 32-bit pixels (`0xAARRGGBB`, BGRA in memory on
/// little-endian hosts).
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    resolution: Resolution,
    pixels: Box<[u32]>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            pixels: vec![0u32; resolution.pixel_count()].into_boxed_slice(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Row stride in pixels.
    pub fn stride(&self) -> usize {
        self.resolution.width as usize
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.stride() + x as usize]
    }

    /// Raw bytes, for handing to a presenter.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 has no padding and every byte pattern is a valid u8; the
        // returned slice borrows self so the pixels cannot be written meanwhile.
        unsafe {
            std::slice::from_raw_parts(
                self.pixels.as_ptr() as *const u8,
                self.pixels.len() * BYTES_PER_PIXEL,
            )
        }
    }

    /// Convert to tightly packed RGBA8, dropping nothing.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * BYTES_PER_PIXEL);
        for &p in self.pixels.iter() {
            let [b, g, r, a] = p.to_le_bytes();
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }

    /// FNV-1a over the pixel words. Cheap fingerprint for comparing frames.
    pub fn checksum(&self) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for &p in self.pixels.iter() {
            hash ^= p as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    /// Base pointer for tile views. Only the scheduler hands this out, and only
    /// while it holds `&mut self` for the whole frame.
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u32 {
        self.pixels.as_mut_ptr()
    }

    /// Set every pixel to `value`.
    pub fn fill(&mut self, value: u32) {
        self.pixels.fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_new_buffer_is_zeroed_and_sized() {
        let fb = FrameBuffer::new(Resolution::new(32, 16));
        assert_eq!(fb.pixels().len(), 512);
        assert_eq!(fb.as_bytes().len(), 512 * BYTES_PER_PIXEL);
        assert!(fb.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_rgba8_swizzles_red_and_blue() {
        let mut fb = FrameBuffer::new(Resolution::new(1, 1));
        fb.fill(0x80_11_22_33);
        assert_eq!(fb.to_rgba8(), vec![0x11, 0x22, 0x33, 0x80]);
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let mut fb = FrameBuffer::new(Resolution::new(4, 4));
        let before = fb.checksum();
        fb.fill(0xC0DE_C0DE);
        assert_ne!(before, fb.checksum());
    }
}
