// src/pool/transient.rs
//! Transient work items on a rayon pool.

use super::{panicked_workers_error, run_guarded, Job, PoolBackend, WorkerPool};
use anyhow::{Context, Result};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Submits one work item per worker each frame and waits for all of them.
pub struct TransientPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl TransientPool {
    pub fn new(workers: usize, thread_name_prefix: &str) -> Result<Self> {
        let prefix = thread_name_prefix.to_string();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .context("Failed to build rayon thread pool")?;
        debug!("TransientPool: {} rayon threads ready", workers);
        Ok(Self { pool, workers })
    }
}

impl WorkerPool for TransientPool {
    fn worker_count(&self) -> usize {
        self.workers
    }

    fn backend(&self) -> PoolBackend {
        PoolBackend::Transient
    }

    fn run(&mut self, job: Job<'_>) -> Result<()> {
        let workers = self.workers;
        let failures = AtomicUsize::new(0);

        // The scope only returns once every spawned item has finished.
        self.pool.scope(|s| {
            for worker_id in 0..workers {
                let failures = &failures;
                s.spawn(move |_| {
                    if !run_guarded(job, worker_id) {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        match failures.load(Ordering::Relaxed) {
            0 => Ok(()),
            n => Err(panicked_workers_error(n)),
        }
    }
}
