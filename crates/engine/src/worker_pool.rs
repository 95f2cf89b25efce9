// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-parallelism worker pool: N concurrent workers pulling from
//! a LIFO-biased task queue, where completing a task may reinject follow-up
//! tasks at the front of the queue so an in-progress item's later stages
//! finish before new input is drawn. A lock-guarded queue paired with an
//! async dispatch loop over `tokio::sync::mpsc` feedback, generalized here
//! from a single-controller event loop to N worker tasks.
//!
//! `run` never returns an error: stage functions are expected to catch and
//! log their own failures (per the pipeline's best-effort error model) and
//! return no follow-up tasks on failure. A panic inside `run` is also
//! caught here so one bad task can never leave `in_flight` stuck above
//! zero and wedge `drive`'s shutdown check.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Drives `task: T` items through `run` with at most `workers` concurrent
/// in-flight tasks. Each call to `run` returns the follow-up tasks to
/// reinject at the front of the queue; an empty vec means the task was
/// terminal. Blocks until the queue is fully drained and all in-flight
/// work has completed.
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drain `initial` (and any follow-ups `run` produces) to completion.
    /// Calling this twice in sequence — once for the primary task set, once
    /// for a finalize/cleanup task set built from what the first drain left
    /// behind — gives two-phase termination, since each call fully drains
    /// before returning.
    pub async fn drive<T, R>(&self, initial: Vec<T>, run: Arc<R>)
    where
        T: Send + 'static,
        R: Fn(T) -> Vec<T> + Send + Sync + 'static,
    {
        let queue = Arc::new(parking_lot::Mutex::new(VecDeque::from(initial)));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Vec<T>>();

        loop {
            loop {
                let next = {
                    let mut q = queue.lock();
                    if q.is_empty() {
                        None
                    } else {
                        let permit = match Arc::clone(&semaphore).try_acquire_owned() {
                            Ok(permit) => permit,
                            Err(_) => break,
                        };
                        q.pop_front().map(|task| (task, permit))
                    }
                };
                let Some((task, permit)) = next else { break };

                in_flight.fetch_add(1, Ordering::SeqCst);
                let run = Arc::clone(&run);
                let done_tx = done_tx.clone();
                let in_flight = Arc::clone(&in_flight);
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    let follow_ups = panic::catch_unwind(AssertUnwindSafe(|| run(task)))
                        .unwrap_or_else(|payload| {
                            let message = payload
                                .downcast_ref::<&str>()
                                .map(|s| s.to_string())
                                .or_else(|| payload.downcast_ref::<String>().cloned())
                                .unwrap_or_else(|| "unknown panic payload".to_string());
                            tracing::error!(panic = %message, "task panicked, dropped with no follow-ups");
                            Vec::new()
                        });
                    let _ = done_tx.send(follow_ups);
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }

            if in_flight.load(Ordering::SeqCst) == 0 && queue.lock().is_empty() {
                break;
            }

            if let Some(follow_ups) = done_rx.recv().await {
                let mut q = queue.lock();
                for task in follow_ups.into_iter().rev() {
                    q.push_front(task);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
