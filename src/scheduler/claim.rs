// src/scheduler/claim.rs
//! Shared tile claim counter.
//!
//! Workers race on a single `fetch_add`. Whatever value a worker gets back is
//! its tile; a value at or past the tile count means the frame's tiles are
//! exhausted and the worker stops. No queue, no "empty" flag.

use std::sync::atomic::{AtomicU32, Ordering};

/// Keeps the counter on its own cache line so claims do not contend with
/// whatever the orchestrator stores next to it.
#[repr(align(64))]
#[derive(Debug, Default)]
struct CachePadded<T>(T);

/// Monotonic source of tile indices for one frame at a time.
#[derive(Debug, Default)]
pub struct TileClaimCounter {
    next: CachePadded<AtomicU32>,
}

impl TileClaimCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next tile index (pre-increment value).
    ///
    /// AcqRel: each call sees the reset from the orchestrator and a unique
    /// predecessor, so no two callers ever get the same index.
    #[inline]
    pub fn claim_next(&self) -> u32 {
        self.next.0.fetch_add(1, Ordering::AcqRel)
    }

    /// Start a new claim epoch. Only called while every worker is parked.
    pub fn reset(&self) {
        self.next.0.store(0, Ordering::Release);
    }

    /// Number of claims made since the last reset, including the ones that
    /// overshot the tile count.
    pub fn claimed(&self) -> u32 {
        self.next.0.load(Ordering::Acquire)
    }
}
