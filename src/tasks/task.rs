//! # Task abstraction.
//!
//! A [`Task`] is an executable unit: a predicate to run plus a completion
//! hook. The common handle type is [`TaskRef`], an `Arc<dyn Task>`; the
//! reference count is the task's lifetime, so a task stays alive exactly
//! as long as a worker queue, a chain, or an executing thread still holds
//! a clone, and the last drop frees it.

use std::sync::Arc;

/// # Executable unit with a completion hook.
///
/// Workers call [`execute`](Task::execute) and then, success or not,
/// [`task_done`](Task::task_done) on the thread that ran the task. A
/// failed predicate is informational: it is logged by the worker but not
/// retried.
///
/// # Example
/// ```
/// use taskbus::Task;
///
/// struct Checkpoint;
///
/// impl Task for Checkpoint {
///     fn name(&self) -> &str { "checkpoint" }
///
///     fn execute(&self) -> bool {
///         // do work...
///         true
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name for logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose;
    /// override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs the stored work and reports success.
    fn execute(&self) -> bool;

    /// Completion hook, invoked by the executing worker after
    /// [`execute`](Task::execute) returns, regardless of the outcome.
    fn task_done(&self) {}
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;
