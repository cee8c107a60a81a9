// src/scheduler/orchestrator.rs
//! Per-frame driver: reset the claim counter, release the workers, wait for
//! every tile, hand the buffer to the presenter.

use crate::framebuffer::FrameBuffer;
use crate::platform::Presenter;
use crate::pool::WorkerPool;
use crate::scheduler::claim::TileClaimCounter;
use crate::scheduler::shader::{FrameInfo, TileShader};
use crate::scheduler::view::{FramePtr, TileView};
use crate::tiles::TileGrid;
use anyhow::{ensure, Context, Result};
use log::trace;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Where the orchestrator is in its per-frame cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Dispatching,
    AwaitingCompletion,
    /// Buffer is stable; no worker holds a view into it.
    Presenting,
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    /// Tiles each worker processed. Sums to the grid's tile count.
    pub tiles_per_worker: Vec<u32>,
    /// Dispatch to barrier.
    pub elapsed: Duration,
}

impl FrameStats {
    pub fn total_tiles(&self) -> u32 {
        self.tiles_per_worker.iter().sum()
    }
}

/// Everything a worker needs for one frame, lent to the pool by reference.
struct FrameContext<'a> {
    grid: TileGrid,
    counter: &'a TileClaimCounter,
    frame: FramePtr,
    shader: &'a dyn TileShader,
    info: FrameInfo,
    tiles_done: &'a [AtomicU32],
}

impl FrameContext<'_> {
    /// The claim loop. Ends when a claim lands past the last tile.
    fn drain(&self, worker_id: usize) {
        let tile_count = self.grid.tile_count();
        let mut done = 0u32;
        loop {
            let index = self.counter.claim_next();
            if index >= tile_count {
                break;
            }
            let rect = self.grid.region_of(index);
            // SAFETY: `index < tile_count`, so `rect` is inside the buffer;
            // the counter hands `index` to nobody else this frame, and grid
            // regions never overlap.
            let mut view = unsafe { TileView::new(self.frame, rect) };
            self.shader.shade(&mut view, &self.info);
            done += 1;
        }
        self.tiles_done[worker_id].store(done, Ordering::Relaxed);
    }
}

/// Owns the buffer, the claim counter and the worker pool, and runs frames.
pub struct FrameOrchestrator {
    grid: TileGrid,
    counter: TileClaimCounter,
    pool: Box<dyn WorkerPool>,
    shader: Box<dyn TileShader>,
    buffer: FrameBuffer,
    tiles_done: Vec<AtomicU32>,
    state: FrameState,
    frame_index: u64,
}

impl FrameOrchestrator {
    pub fn new(grid: TileGrid, pool: Box<dyn WorkerPool>, shader: Box<dyn TileShader>) -> Self {
        let tiles_done = (0..pool.worker_count()).map(|_| AtomicU32::new(0)).collect();
        Self {
            buffer: FrameBuffer::new(grid.resolution()),
            grid,
            counter: TileClaimCounter::new(),
            pool,
            shader,
            tiles_done,
            state: FrameState::Idle,
            frame_index: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Index the next frame will get.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn claim_counter(&self) -> &TileClaimCounter {
        &self.counter
    }

    /// Run one full cycle and present the result.
    ///
    /// An error means a worker panicked or the presenter failed; either is
    /// fatal and the orchestrator should not be ticked again.
    pub fn tick(
        &mut self,
        presenter: &mut dyn Presenter,
        time: f64,
        delta: f32,
    ) -> Result<FrameStats> {
        let stats = self.render(time, delta)?;
        self.present(presenter)?;
        Ok(stats)
    }

    /// `Idle -> Dispatching -> AwaitingCompletion -> Presenting`.
    ///
    /// On success the buffer is complete and the orchestrator waits in
    /// `Presenting` until [`FrameOrchestrator::present`] is called.
    pub fn render(&mut self, time: f64, delta: f32) -> Result<FrameStats> {
        ensure!(
            self.state == FrameState::Idle,
            "render called in state {:?}",
            self.state
        );
        let started = Instant::now();
        let info = FrameInfo {
            index: self.frame_index,
            time,
            delta,
        };

        // Every worker is parked, so this store races with nothing; the pool
        // handoff below publishes it.
        self.transition(FrameState::Dispatching);
        self.counter.reset();
        for slot in &self.tiles_done {
            slot.store(0, Ordering::Relaxed);
        }

        let stride = self.buffer.stride();
        let len = self.buffer.pixels().len();
        let ctx = FrameContext {
            grid: self.grid,
            counter: &self.counter,
            frame: FramePtr::new(self.buffer.as_mut_ptr(), stride, len),
            shader: self.shader.as_ref(),
            info,
            tiles_done: &self.tiles_done,
        };

        self.state = FrameState::AwaitingCompletion;
        trace!("Frame {}: {:?}", info.index, self.state);
        // Barrier: returns only after every worker left its claim loop.
        self.pool
            .run(&|worker_id| ctx.drain(worker_id))
            .with_context(|| format!("Frame {} failed", info.index))?;

        self.transition(FrameState::Presenting);
        self.frame_index += 1;

        Ok(FrameStats {
            frame_index: info.index,
            tiles_per_worker: self
                .tiles_done
                .iter()
                .map(|t| t.load(Ordering::Relaxed))
                .collect(),
            elapsed: started.elapsed(),
        })
    }

    /// `Presenting -> Idle`: give the finished buffer to the presenter.
    pub fn present(&mut self, presenter: &mut dyn Presenter) -> Result<()> {
        ensure!(
            self.state == FrameState::Presenting,
            "present called in state {:?}",
            self.state
        );
        presenter
            .present(&self.buffer)
            .context("Presenter rejected the frame")?;
        self.transition(FrameState::Idle);
        Ok(())
    }

    fn transition(&mut self, next: FrameState) {
        trace!("Frame {}: {:?} -> {:?}", self.frame_index, self.state, next);
        self.state = next;
    }
}
