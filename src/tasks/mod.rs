//! Task abstractions executed by the worker pool.
//!
//! - [`Task`] / [`TaskRef`]: the executable unit and its shared handle;
//! - [`TaskFn`]: closure-backed one-shot task;
//! - [`ChainTask`]: reschedulable task forming a completion chain.

mod chain;
mod task;
mod task_fn;

pub use chain::{ChainPredicate, ChainTask};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
