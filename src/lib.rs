//! # taskbus
//!
//! **taskbus** is a typed in-process event bus plus a thread-pool task
//! scheduler, for event-driven multi-threaded applications that do not
//! want a framework runtime. No async executor is involved: every call
//! either completes synchronously or blocks the calling thread on a lock
//! or a queue wait.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            callers (any thread)
//!      broadcast / event / multicast / invoke
//!                     │
//!                     ▼
//! ┌───────────────────────────────────────────────────┐
//! │  Bus context (one per interface type, lazy)       │
//! │  - GLOBAL:  priority-ordered handler list         │
//! │  - ONE2ONE: key → single handler                  │
//! │  - GROUP:   key → priority-ordered handler list   │
//! └──────┬─────────────────────────────┬──────────────┘
//!        ▼                             ▼
//!   app handlers               SchedulerBus handler
//!  (Arc<dyn Interface>)     ┌──────────────────────────┐
//!                           │  TaskScheduler           │
//!                           │  - least-loaded dispatch │
//!                           └──┬────────┬────────┬─────┘
//!                              ▼        ▼        ▼
//!                          worker 0  worker 1  worker N   (one thread each)
//!                              │        │        │
//!                         FIFO queue, graceful drain on shutdown
//! ```
//!
//! ### Task lifecycle
//! ```text
//! TaskRef ──add_task──► worker queue ──► execute() ──► task_done()
//!                                                        │
//! ChainTask: reschedule()* then finish(cb)               ├─ successor? resubmit via bus
//!            (finish seals + submits the head)           └─ terminal?  run cb once
//! ```
//!
//! ## Features
//! | Area           | Description                                              | Key types                                  |
//! |----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Bus**        | Three addressing modes, resolved at compile time.        | [`GlobalBus`], [`UnicastBus`], [`GroupBus`]|
//! | **Priority**   | Descending delivery order, stable ties.                  | [`Priority`]                               |
//! | **Signals**    | Object-scoped events, one source value per signal.       | [`Signal`]                                 |
//! | **Tasks**      | Work units with completion hooks, shared by refcount.    | [`Task`], [`TaskRef`], [`TaskFn`]          |
//! | **Chains**     | At most one successor per link, sealed by `finish`.      | [`ChainTask`]                              |
//! | **Scheduling** | Fixed pool, least-loaded dispatch, reachable via bus.    | [`TaskScheduler`], [`Scheduling`]          |
//!
//! ## Ordering guarantees
//! - Within one GLOBAL or GROUP list: descending priority, ties in
//!   connection order.
//! - Within one worker: FIFO.
//! - Across workers: none; pipelines that need a global order should use
//!   a [`ChainTask`], which serializes its links by construction.
//!
//! ## Example
//! ```rust
//! use std::sync::mpsc;
//! use taskbus::{SchedulerConfig, TaskScheduler};
//!
//! let scheduler = TaskScheduler::new(SchedulerConfig { workers: 2 });
//! let (tx, rx) = mpsc::channel();
//!
//! // Build a three-step chain; nothing runs until finish() seals it.
//! let head = taskbus::add_reschedulable_task(|| {
//!     // step 0
//!     true
//! })
//! .expect("scheduler connected");
//!
//! let tail = head.reschedule(|| {
//!     // step 1
//!     true
//! })
//! .expect("first successor");
//!
//! tail.finish(move || {
//!     let _ = tx.send("chain complete");
//! });
//!
//! assert_eq!(rx.recv().unwrap(), "chain complete");
//! drop(scheduler); // drains both workers before returning
//! ```

mod bus;
mod core;
mod error;
mod registry;
mod tasks;

// ---- Public re-exports ----

pub use bus::{Connection, GlobalBus, GroupBus, Priority, Signal, SignalConnection, UnicastBus};
pub use core::{add_reschedulable_task, add_task, SchedulerBus, SchedulerConfig, Scheduling, TaskScheduler};
pub use error::BusError;
pub use tasks::{ChainPredicate, ChainTask, Task, TaskFn, TaskRef};
