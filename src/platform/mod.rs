// src/platform/mod.rs
//
// Host-side collaborators of the frame scheduler: event source, presenter
// and frame clock.

use crate::framebuffer::FrameBuffer;
use crate::tiles::Resolution;
use anyhow::Result;

pub mod clock;
pub mod headless;

pub use clock::{FrameClock, FrameTiming};
pub use headless::HeadlessPlatform;

/// Keys the loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySymbol {
    Escape,
    /// Any other key, by platform keycode.
    Other(u32),
}

/// Events drained from the platform between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The window was closed.
    CloseRequested,
    KeyPressed(KeySymbol),
}

/// Receives a finished frame. The buffer is read-only and stable for the
/// duration of the call; no worker is writing to it.
pub trait Presenter {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()>;
}

/// A window (or stand-in) the render loop runs against.
///
/// Rendering only happens when `poll_event` has nothing pending, so event
/// handling and frame presentation never interleave.
pub trait Platform: Presenter {
    /// Next pending event, without blocking.
    fn poll_event(&mut self) -> Result<Option<PlatformEvent>>;

    /// Update the window title (used for the FPS readout).
    fn set_title(&mut self, title: &str) -> Result<()>;

    /// Output resolution; fixed for the platform's lifetime.
    fn resolution(&self) -> Resolution;

    /// Release platform resources before exit.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}
