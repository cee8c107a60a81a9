// src/pool/tests.rs

use crate::pool::{build_pool, PoolBackend, WorkerCountPolicy, WorkerPool};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use test_log::test;

const BACKENDS: [PoolBackend; 2] = [PoolBackend::Transient, PoolBackend::Persistent];

fn cores(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_policy_all_cores() {
    assert_eq!(WorkerCountPolicy::AllCores.resolve_with(cores(8)).unwrap(), 8);
}

#[test]
fn test_policy_reserve_orchestrator() {
    let policy = WorkerCountPolicy::ReserveOrchestrator;
    assert_eq!(policy.resolve_with(cores(8)).unwrap(), 7);
    assert_eq!(policy.resolve_with(cores(1)).unwrap(), 1);
}

#[test]
fn test_policy_fixed() {
    assert_eq!(WorkerCountPolicy::Fixed(3).resolve_with(cores(64)).unwrap(), 3);
    assert!(WorkerCountPolicy::Fixed(0).resolve_with(cores(64)).is_err());
}

#[test]
fn test_policy_resolves_on_this_machine() {
    assert!(WorkerCountPolicy::AllCores.resolve().unwrap() >= 1);
}

#[test]
fn test_build_pool_rejects_zero_workers() {
    for backend in BACKENDS {
        assert!(build_pool(backend, 0, "test-worker").is_err());
    }
}

#[test]
fn test_run_calls_job_once_per_worker() {
    for backend in BACKENDS {
        let mut pool = build_pool(backend, 4, "test-worker").unwrap();
        assert_eq!(pool.worker_count(), 4);
        assert_eq!(pool.backend(), backend);

        for _ in 0..10 {
            let seen = Mutex::new(Vec::new());
            pool.run(&|worker_id| seen.lock().unwrap().push(worker_id))
                .unwrap();
            let mut seen = seen.into_inner().unwrap();
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3], "backend {:?}", backend);
        }
    }
}

#[test]
fn test_no_job_in_flight_after_run_returns() {
    for backend in BACKENDS {
        let mut pool = build_pool(backend, 6, "test-worker").unwrap();
        let in_flight = AtomicUsize::new(0);
        let finished = AtomicUsize::new(0);

        for frame in 1..=20 {
            pool.run(&|_| {
                in_flight.fetch_add(1, Ordering::SeqCst);
                std::thread::yield_now();
                in_flight.fetch_sub(1, Ordering::SeqCst);
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            assert_eq!(in_flight.load(Ordering::SeqCst), 0);
            assert_eq!(finished.load(Ordering::SeqCst), frame * 6);
        }
    }
}

#[test]
fn test_panicking_job_is_reported_and_pool_survives() {
    for backend in BACKENDS {
        let mut pool = build_pool(backend, 3, "test-worker").unwrap();
        let completed = AtomicUsize::new(0);

        let result = pool.run(&|worker_id| {
            if worker_id == 1 {
                panic!("boom");
            }
            completed.fetch_add(1, Ordering::SeqCst);
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 worker(s) panicked"));
        assert_eq!(completed.load(Ordering::SeqCst), 2);

        // The barrier held, so the pool is still usable afterwards.
        let count = AtomicUsize::new(0);
        pool.run(&|_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}

#[test]
fn test_persistent_pool_drops_cleanly_without_running() {
    let pool = build_pool(PoolBackend::Persistent, 2, "test-worker").unwrap();
    drop(pool);
}
