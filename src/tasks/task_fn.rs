//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a predicate closure `F: Fn() -> bool` and an optional
//! completion closure. The predicate is `Fn`, not `FnMut`: a task may be
//! executed from any worker thread, so shared state belongs in an
//! explicit `Arc<...>` captured by the closure, not in hidden mutation.

use std::borrow::Cow;
use std::sync::Arc;

use crate::tasks::task::Task;

/// Function-backed task implementation.
///
/// # Example
/// ```
/// use taskbus::{Task, TaskFn, TaskRef};
///
/// let t: TaskRef = TaskFn::arc("tick", || true);
/// assert_eq!(t.name(), "tick");
/// assert!(t.execute());
/// ```
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    exec: F,
    done: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a
    /// [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, exec: F) -> Self {
        Self {
            name: name.into(),
            exec,
            done: None,
        }
    }

    /// Attaches a completion hook, run after each execution.
    pub fn on_done(mut self, done: impl Fn() + Send + Sync + 'static) -> Self {
        self.done = Some(Box::new(done));
        self
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, exec: F) -> Arc<Self> {
        Arc::new(Self::new(name, exec))
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> bool {
        (self.exec)()
    }

    fn task_done(&self) {
        if let Some(done) = &self.done {
            done();
        }
    }
}
