// src/pool/persistent.rs
//! Persistent worker threads driven by begin/end signals.
//!
//! ```text
//!  orchestrator                 worker i
//!  ────────────                 ────────
//!  begin[i].post(Run(job)) ───▶ begin.take()   (parked until posted)
//!                               job(i)
//!  end[i].take()          ◀──── end.post(ok)
//! ```
//!
//! Each worker owns one [`Signal`] pair. The orchestrator posts every begin
//! signal, then takes every end signal; that second loop is the frame barrier.

use super::{panicked_workers_error, run_guarded, Job, PoolBackend, WorkerPool};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// One-slot, auto-resetting signal carrying a value.
///
/// `post` stores the value and wakes the waiter; `take` parks until a value is
/// present and clears the slot.
struct Signal<T> {
    slot: Mutex<Option<T>>,
    cv: Condvar,
}

impl<T> Signal<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            cv: Condvar::new(),
        }
    }

    fn post(&self, value: T) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        debug_assert!(slot.is_none(), "signal posted twice without a take");
        *slot = Some(value);
        self.cv.notify_one();
    }

    fn take(&self) -> T {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self.cv.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Job pointer with its borrow lifetime erased so it can be parked in a
/// `'static` worker's signal.
#[derive(Clone, Copy)]
struct RawJob(*const (dyn Fn(usize) + Sync + 'static));

// SAFETY: the pointee is Sync, and `PersistentPool::run` does not return (and
// so does not end the borrow) until every worker has posted its end signal.
unsafe impl Send for RawJob {}

enum Command {
    Run(RawJob),
    Stop,
}

struct WorkerSignals {
    begin: Signal<Command>,
    end: Signal<bool>,
}

struct Worker {
    signals: Arc<WorkerSignals>,
    handle: Option<JoinHandle<()>>,
}

/// Fixed set of named threads, each running the frame job once per `run`.
pub struct PersistentPool {
    workers: Vec<Worker>,
}

impl PersistentPool {
    pub fn new(workers: usize, thread_name_prefix: &str) -> Result<Self> {
        let mut pool = Self {
            workers: Vec::with_capacity(workers),
        };

        for worker_id in 0..workers {
            let signals = Arc::new(WorkerSignals {
                begin: Signal::new(),
                end: Signal::new(),
            });
            let thread_signals = Arc::clone(&signals);
            // On error `pool` drops here and stops the workers spawned so far.
            let handle = thread::Builder::new()
                .name(format!("{}-{}", thread_name_prefix, worker_id))
                .spawn(move || worker_loop(worker_id, &thread_signals))
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id))?;
            pool.workers.push(Worker {
                signals,
                handle: Some(handle),
            });
        }

        debug!("PersistentPool: {} worker threads parked", workers);
        Ok(pool)
    }
}

fn worker_loop(worker_id: usize, signals: &WorkerSignals) {
    loop {
        match signals.begin.take() {
            Command::Run(raw) => {
                // SAFETY: see `RawJob`; the orchestrator is blocked on our end
                // signal for as long as this reference is used.
                let job: Job<'_> = unsafe { &*raw.0 };
                let ok = run_guarded(job, worker_id);
                signals.end.post(ok);
            }
            Command::Stop => break,
        }
    }
    debug!("PersistentPool: worker {} exiting", worker_id);
}

impl WorkerPool for PersistentPool {
    fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn backend(&self) -> PoolBackend {
        PoolBackend::Persistent
    }

    fn run(&mut self, job: Job<'_>) -> Result<()> {
        // SAFETY: only the lifetime changes; the end-signal loop below keeps
        // `job` borrowed until no worker can dereference the pointer.
        let ptr: *const (dyn Fn(usize) + Sync + '_) = job;
        let raw = RawJob(unsafe {
            std::mem::transmute::<_, *const (dyn Fn(usize) + Sync + 'static)>(ptr)
        });

        for worker in &self.workers {
            worker.signals.begin.post(Command::Run(raw));
        }

        let failures = self
            .workers
            .iter()
            .filter(|worker| !worker.signals.end.take())
            .count();

        match failures {
            0 => Ok(()),
            n => Err(panicked_workers_error(n)),
        }
    }
}

impl Drop for PersistentPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.signals.begin.post(Command::Stop);
        }
        for (worker_id, worker) in self.workers.iter_mut().enumerate() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!("PersistentPool: worker {} did not exit cleanly", worker_id);
                }
            }
        }
    }
}
