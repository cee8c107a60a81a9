// src/pool/mod.rs
//! Worker pools that run one job per worker per frame.
//!
//! Two execution models sit behind the same [`WorkerPool`] trait:
//!
//! - [`TransientPool`]: submits one work item per worker to a `rayon` pool
//!   and joins them with a scope.
//! - [`PersistentPool`]: long-lived threads parked on a per-worker begin
//!   signal, each raising an end signal when its job returns.
//!
//! The frame scheduler is written once against the trait. Either way `run`
//! is the frame barrier: when it returns, no worker is still executing the job.

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub mod persistent;
pub mod transient;

pub use persistent::PersistentPool;
pub use transient::TransientPool;

/// A job run once on every worker. The argument is the worker id.
pub type Job<'a> = &'a (dyn Fn(usize) + Sync);

/// Fixed-size set of workers that can run a borrowed job to completion.
pub trait WorkerPool: Send {
    /// Number of workers; fixed for the pool's lifetime.
    fn worker_count(&self) -> usize;

    /// Which execution model this pool uses.
    fn backend(&self) -> PoolBackend;

    /// Call `job(worker_id)` once on each worker and block until every call
    /// has returned.
    ///
    /// Returns an error if any call panicked. The barrier still holds in that
    /// case: all other calls have finished before the error is returned.
    fn run(&mut self, job: Job<'_>) -> Result<()>;
}

/// Execution model for the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolBackend {
    /// Per-frame work items on a rayon thread pool.
    #[default]
    Transient,
    /// Dedicated threads with begin/end signal pairs.
    Persistent,
}

/// How many workers to create from the detected hardware concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCountPolicy {
    /// One worker per logical core.
    #[default]
    AllCores,
    /// Leave one core to the orchestrator thread (never fewer than one worker).
    ReserveOrchestrator,
    /// Exactly this many workers.
    Fixed(usize),
}

impl WorkerCountPolicy {
    /// Resolve against a known core count.
    pub fn resolve_with(self, cores: NonZeroUsize) -> Result<usize> {
        match self {
            WorkerCountPolicy::AllCores => Ok(cores.get()),
            WorkerCountPolicy::ReserveOrchestrator => Ok((cores.get() - 1).max(1)),
            WorkerCountPolicy::Fixed(0) => bail!("fixed worker count must be >= 1"),
            WorkerCountPolicy::Fixed(n) => Ok(n),
        }
    }

    /// Resolve against `std::thread::available_parallelism`.
    pub fn resolve(self) -> Result<usize> {
        let cores = std::thread::available_parallelism()
            .context("Failed to query available hardware concurrency")?;
        self.resolve_with(cores)
    }
}

/// Create the pool for `backend` with `workers` threads.
///
/// Any failure here is a setup failure; callers are expected to abort.
pub fn build_pool(
    backend: PoolBackend,
    workers: usize,
    thread_name_prefix: &str,
) -> Result<Box<dyn WorkerPool>> {
    if workers == 0 {
        bail!("worker pool needs at least one worker");
    }
    info!(
        "Creating {:?} worker pool with {} workers",
        backend, workers
    );
    let pool: Box<dyn WorkerPool> = match backend {
        PoolBackend::Transient => Box::new(
            TransientPool::new(workers, thread_name_prefix)
                .context("Failed to create transient worker pool")?,
        ),
        PoolBackend::Persistent => Box::new(
            PersistentPool::new(workers, thread_name_prefix)
                .context("Failed to create persistent worker pool")?,
        ),
    };
    Ok(pool)
}

/// Run the job for one worker, converting a panic into `false`.
pub(crate) fn run_guarded(job: Job<'_>, worker_id: usize) -> bool {
    match catch_unwind(AssertUnwindSafe(|| job(worker_id))) {
        Ok(()) => true,
        Err(_) => {
            log::error!("Worker {} panicked while running its frame job", worker_id);
            false
        }
    }
}

pub(crate) fn panicked_workers_error(count: usize) -> anyhow::Error {
    anyhow!("{} worker(s) panicked during the frame", count)
}

#[cfg(test)]
mod tests;
