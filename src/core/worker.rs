//! # Task worker: one thread, one queue.
//!
//! A [`TaskWorker`] owns the producer side of a FIFO channel of
//! `Option<TaskRef>`; its thread blocks on the consumer side. `None` is
//! the shutdown sentinel, not work.
//!
//! ## State machine
//! ```text
//! running ──shutdown()──► shutting-down ──queue drained──► stopped
//!   │                        │
//!   │ add_task → queued      │ add_task → false
//!   │ pop blocks when empty  │ drain remaining synchronously
//! ```
//!
//! ## Rules
//! - `shutdown` flips the liveness flag *then* pushes the sentinel, so a
//!   loop blocked on an empty queue always wakes.
//! - After waking on the sentinel the loop drains every task still in the
//!   channel, including any that raced past the liveness check in
//!   `add_task`: a submission that returned `true` is never dropped.
//! - `add_task` after shutdown returns `false` instead of growing a queue
//!   nobody will drain.
//! - Tasks run in FIFO order on this worker; there is no cross-worker
//!   ordering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::tasks::TaskRef;

/// Handle to one worker thread and its task queue.
pub(crate) struct TaskWorker {
    tx: Sender<Option<TaskRef>>,
    live: Arc<AtomicBool>,
    index: usize,
}

impl TaskWorker {
    /// Starts a worker thread and returns its handle plus the join handle
    /// of the spawned thread.
    pub(crate) fn spawn(index: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = crossbeam_channel::unbounded::<Option<TaskRef>>();
        let live = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&live);
        let thread = std::thread::spawn(move || worker_loop(index, rx, flag));
        (Self { tx, live, index }, thread)
    }

    /// Queues a task for execution.
    ///
    /// Returns `false` once shutdown has begun.
    pub(crate) fn add_task(&self, task: TaskRef) -> bool {
        if !self.live.load(Ordering::Acquire) {
            return false;
        }
        self.tx.send(Some(task)).is_ok()
    }

    /// Returns true while the worker accepts new tasks.
    pub(crate) fn live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Number of queued, not yet popped submissions.
    pub(crate) fn pending(&self) -> usize {
        self.tx.len()
    }

    /// Begins shutdown: no new tasks are accepted, the consuming loop is
    /// woken and drains the queue before its thread exits. Idempotent.
    pub(crate) fn shutdown(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            debug!(worker = self.index, "worker shutdown requested");
            let _ = self.tx.send(None);
        }
    }
}

fn worker_loop(index: usize, rx: Receiver<Option<TaskRef>>, live: Arc<AtomicBool>) {
    debug!(worker = index, "task worker started");
    while let Ok(message) = rx.recv() {
        match message {
            Some(task) => run_one(task),
            // Sentinel: wake signal, not work.
            None => {
                if !live.load(Ordering::Acquire) {
                    while let Ok(Some(task)) = rx.try_recv() {
                        run_one(task);
                    }
                    break;
                }
            }
        }
    }
    debug!(worker = index, "task worker stopped");
}

fn run_one(task: TaskRef) {
    trace!(task = task.name(), "executing task");
    if !task.execute() {
        warn!(task = task.name(), "task predicate reported failure");
    }
    task.task_done();
}
