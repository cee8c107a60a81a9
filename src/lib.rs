// src/lib.rs
//! Real-time software render loop skeleton.
//!
//! Each frame the [`scheduler::FrameOrchestrator`] splits a fixed-resolution
//! pixel buffer into square tiles, lets a fixed pool of workers claim tiles
//! from one shared atomic counter until none are left, waits for all of them,
//! and hands the finished buffer to a presenter.

pub mod app;
pub mod config;
pub mod framebuffer;
pub mod platform;
pub mod pool;
pub mod scheduler;
pub mod tiles;

pub use framebuffer::FrameBuffer;
pub use scheduler::{FrameOrchestrator, TileShader, TileView};
pub use tiles::{Resolution, TileGrid, TileRect};
