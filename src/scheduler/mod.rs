// src/scheduler/mod.rs
//! Tile scheduler and frame barrier.
//!
//! - `claim`: the shared atomic counter workers draw tile indices from
//! - `view`: exclusive per-tile pixel access handed to the shader
//! - `shader`: the per-tile work function
//! - `orchestrator`: the per-frame state machine that ties them together

pub mod claim;
pub mod orchestrator;
pub mod shader;
pub mod view;

pub use claim::TileClaimCounter;
pub use orchestrator::{FrameOrchestrator, FrameState, FrameStats};
pub use shader::{FrameInfo, Gradient, GenerationStamp, SolidFill, TileShader, PLACEHOLDER_FILL};
pub use view::TileView;
