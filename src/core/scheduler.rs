//! # Load-balancing task scheduler.
//!
//! [`TaskScheduler`] owns a fixed pool of [`TaskWorker`]s, one OS thread
//! each, and is itself a bus handler: it registers a [`Scheduling`]
//! implementation on [`SchedulerBus`] at construction, so any code
//! location (including a task's own completion logic) can submit work
//! without holding a scheduler reference.
//!
//! ```text
//! caller ──add_task──► SchedulerBus ──invoke──► TaskScheduler
//!                                                 │ least-loaded scan
//!                                                 ▼
//!                                  worker 0 | worker 1 | ... | worker N
//! ```
//!
//! ## Load balancing
//! `add_task` scans live workers for the fewest pending submissions and
//! enqueues there; ties go to the first worker encountered. The policy is
//! greedy and non-preemptive: queued work never migrates. Dead workers
//! are skipped up front, not detected after a failed push.
//!
//! ## Teardown order
//! Dropping the scheduler (1) initiates shutdown on every worker, which
//! drains each queue, (2) drops the bus registration so late submissions
//! fail cleanly instead of racing a dying pool, then (3) joins every
//! worker thread.

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info};

use crate::bus::{Connection, GlobalBus, Priority};
use crate::core::config::SchedulerConfig;
use crate::core::worker::TaskWorker;
use crate::tasks::{ChainPredicate, ChainTask, TaskRef};

/// # The scheduling interface dispatched over the bus.
///
/// Implemented by the scheduler's registered core; callers reach it via
/// [`SchedulerBus`] or the crate-level [`add_task`] /
/// [`add_reschedulable_task`] helpers.
pub trait Scheduling: Send + Sync {
    /// Submits a task to the pool. Returns `false` when no live worker
    /// accepted it.
    fn add_task(&self, task: TaskRef) -> bool;

    /// Builds an unsubmitted chain head; execution begins only when
    /// [`ChainTask::finish`] seals and submits the chain.
    fn add_reschedulable_task(&self, exec: ChainPredicate) -> Arc<ChainTask>;
}

/// GLOBAL-mode bus carrying the scheduling interface.
pub type SchedulerBus = GlobalBus<dyn Scheduling>;

/// Submits `task` through the scheduling bus.
///
/// Returns `false` when no scheduler is connected or the pool refused
/// the task (shutdown in progress).
pub fn add_task(task: TaskRef) -> bool {
    SchedulerBus::invoke(move |scheduler| scheduler.add_task(task)).unwrap_or(false)
}

/// Builds a reschedulable chain head through the scheduling bus.
///
/// The chain is not submitted; grow it with
/// [`ChainTask::reschedule`] and seal it with [`ChainTask::finish`].
/// Returns `None` when no scheduler is connected.
pub fn add_reschedulable_task(
    exec: impl Fn() -> bool + Send + Sync + 'static,
) -> Option<Arc<ChainTask>> {
    let exec: ChainPredicate = Box::new(exec);
    SchedulerBus::invoke(move |scheduler| scheduler.add_reschedulable_task(exec))
}

/// The bus-registered half of the scheduler: the worker pool.
struct SchedulerCore {
    workers: Vec<TaskWorker>,
}

impl Scheduling for SchedulerCore {
    fn add_task(&self, task: TaskRef) -> bool {
        let target = self
            .workers
            .iter()
            .filter(|worker| worker.live())
            .min_by_key(|worker| worker.pending());
        match target {
            Some(worker) => worker.add_task(task),
            None => false,
        }
    }

    fn add_reschedulable_task(&self, exec: ChainPredicate) -> Arc<ChainTask> {
        ChainTask::from_predicate(exec)
    }
}

/// Fixed worker pool plus its bus registration.
///
/// # Example
/// ```
/// use std::sync::mpsc;
/// use taskbus::{SchedulerConfig, TaskFn, TaskScheduler};
///
/// let scheduler = TaskScheduler::new(SchedulerConfig { workers: 2 });
///
/// let (tx, rx) = mpsc::channel();
/// let task = std::sync::Arc::new(
///     TaskFn::new("ping", || true).on_done(move || {
///         let _ = tx.send(());
///     }),
/// );
///
/// assert!(taskbus::add_task(task));
/// rx.recv().unwrap();
/// drop(scheduler);
/// ```
pub struct TaskScheduler {
    core: Arc<SchedulerCore>,
    connection: Option<Connection<dyn Scheduling>>,
    threads: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    /// Builds the pool, spawns one thread per worker and registers the
    /// scheduler on [`SchedulerBus`].
    pub fn new(config: SchedulerConfig) -> Self {
        let count = config.worker_count();
        let mut workers = Vec::with_capacity(count);
        let mut threads = Vec::with_capacity(count);
        for index in 0..count {
            let (worker, thread) = TaskWorker::spawn(index);
            workers.push(worker);
            threads.push(thread);
        }

        let core = Arc::new(SchedulerCore { workers });
        let handler: Arc<dyn Scheduling> = core.clone();
        let connection = SchedulerBus::connect(handler, Priority::default());

        info!(workers = count, "task scheduler started");
        Self {
            core,
            connection: Some(connection),
            threads,
        }
    }

    /// Size of the worker pool.
    pub fn worker_count(&self) -> usize {
        self.core.workers.len()
    }

    /// Total submissions queued across the pool. Diagnostics and tests.
    pub fn queued_tasks(&self) -> usize {
        self.core.workers.iter().map(TaskWorker::pending).sum()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for worker in &self.core.workers {
            worker.shutdown();
        }
        // Deregister only after the drain has begun: a submission racing
        // this drop either lands before the sentinel and is drained, or
        // fails the liveness check and reports false to its caller.
        self.connection.take();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
        debug!("task scheduler stopped");
    }
}

/// Serializes tests that register handlers on the process-wide
/// [`SchedulerBus`].
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard};

    static SCHEDULER_BUS: Mutex<()> = Mutex::new(());

    pub(crate) fn lock() -> MutexGuard<'static, ()> {
        SCHEDULER_BUS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
