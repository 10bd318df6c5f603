//! Data-parallel fan-out helpers.
//!
//! Workers pull task indices from a shared counter until the queue is empty.
//! One hardware thread is left unused so interrupt handling does not stall
//! the pool, and the calling thread always runs one worker inline.

use std::sync::atomic::{AtomicUsize, Ordering};

fn hardware_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn worker_count(job_count: usize, max_threads: usize) -> usize {
    let available = hardware_threads().saturating_sub(1).max(1);
    available.min(max_threads).min(job_count).max(1)
}

/// Run `job(index)` for every index in `0..job_count`, spreading the indices
/// over up to `max_threads` workers. With one job or one worker, everything
/// runs inline on the caller.
pub fn threaded_work_by_index<F>(job: F, job_count: usize, max_threads: usize)
where
    F: Fn(usize) + Sync,
{
    if job_count == 0 {
        return;
    }
    let workers = worker_count(job_count, max_threads);
    if job_count <= 1 || workers <= 1 {
        for index in 0..job_count {
            job(index);
        }
        return;
    }
    let next = AtomicUsize::new(0);
    let run = || {
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            if index >= job_count {
                break;
            }
            job(index);
        }
    };
    let run = &run;
    std::thread::scope(|scope| {
        for _ in 1..workers {
            scope.spawn(move || run());
        }
        // The caller acts as the first worker.
        run();
    });
}

/// Run every closure in `jobs`, spreading them over up to `max_threads`
/// workers.
pub fn threaded_work_from_array(jobs: Vec<Box<dyn FnOnce() + Send>>, max_threads: usize) {
    let job_count = jobs.len();
    if job_count == 0 {
        return;
    }
    let workers = worker_count(job_count, max_threads);
    if job_count <= 1 || workers <= 1 {
        for job in jobs {
            job();
        }
        return;
    }
    let next = AtomicUsize::new(0);
    let slots: Vec<std::sync::Mutex<Option<Box<dyn FnOnce() + Send>>>> =
        jobs.into_iter().map(|job| std::sync::Mutex::new(Some(job))).collect();
    let run = || {
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            if index >= job_count {
                break;
            }
            if let Some(job) = slots[index].lock().unwrap().take() {
                job();
            }
        }
    };
    let run = &run;
    std::thread::scope(|scope| {
        for _ in 1..workers {
            scope.spawn(move || run());
        }
        run();
    });
}
