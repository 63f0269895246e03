//! # Reschedulable task chains.
//!
//! A [`ChainTask`] is a task that may declare at most one successor,
//! forming a completion chain that hops across the worker pool without
//! blocking any thread:
//!
//! ```text
//! add_reschedulable_task(a) ──► [a] ──reschedule(b)──► [a]→[b]
//!                                                        │
//!                                  finish(cb) ◄──────────┘
//!                                    seals every link, submits [a]
//!
//! worker: execute(a) ── task_done(a) ──submit──► execute(b)
//!                                     task_done(b) ──► cb()   (terminal)
//! ```
//!
//! ## Rules
//! - Links own their successor (`Arc`) and know their predecessor only
//!   weakly; the queue holding the head keeps the whole chain alive.
//! - `reschedule` fails (`None`) if a successor already exists or the
//!   chain is sealed; the first successor is never replaced.
//! - `finish` is the only operation that submits a chain. Until it runs,
//!   a chain is in-memory bookkeeping and never executes; after it runs,
//!   every link is sealed and the chain can no longer grow. A link can
//!   therefore never execute while its chain is still mutable.
//! - Call `finish` on the *last* link: the terminal callback belongs to
//!   the link that has no successor.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{error, warn};

use crate::tasks::task::{Task, TaskRef};

/// Boxed predicate executed by one chain link.
pub type ChainPredicate = Box<dyn Fn() -> bool + Send + Sync>;

#[derive(Default)]
struct Links {
    prev: Option<Weak<ChainTask>>,
    next: Option<Arc<ChainTask>>,
    on_finish: Option<Box<dyn FnOnce() + Send>>,
    sealed: bool,
}

/// One link of a reschedulable task chain.
pub struct ChainTask {
    exec: ChainPredicate,
    // Weak self-handle so &self methods can mint owning references for
    // successors and submission.
    this: Weak<ChainTask>,
    links: Mutex<Links>,
}

impl ChainTask {
    /// Creates an unsubmitted chain head.
    pub fn new(exec: impl Fn() -> bool + Send + Sync + 'static) -> Arc<Self> {
        Self::from_predicate(Box::new(exec))
    }

    pub(crate) fn from_predicate(exec: ChainPredicate) -> Arc<Self> {
        Self::with_links(exec, Links::default())
    }

    fn with_links(exec: ChainPredicate, links: Links) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            exec,
            this: this.clone(),
            links: Mutex::new(links),
        })
    }

    /// Appends a successor link running `exec` after this link completes.
    ///
    /// Returns `None` without replacing anything when this link already
    /// has a successor, or when the chain was already sealed by
    /// [`finish`](ChainTask::finish). Ignoring the `None` discards the
    /// intended continuation, so callers must check it.
    pub fn reschedule(
        &self,
        exec: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Option<Arc<ChainTask>> {
        let mut links = self.links.lock();
        if links.sealed {
            warn!("reschedule on a sealed chain rejected");
            return None;
        }
        if links.next.is_some() {
            warn!("reschedule rejected: link already has a successor");
            return None;
        }
        let next = Self::with_links(
            Box::new(exec),
            Links {
                prev: Some(self.this.clone()),
                ..Links::default()
            },
        );
        links.next = Some(Arc::clone(&next));
        Some(next)
    }

    /// Seals the chain and submits it for execution.
    ///
    /// Stores `on_finish` as this link's terminal callback, walks back to
    /// the chain head sealing every link on the way, and submits the head
    /// through the scheduling bus. Returns whether the head was accepted;
    /// `false` means no scheduler is connected (the chain is dropped) or
    /// `finish` was already called.
    pub fn finish(&self, on_finish: impl FnOnce() + Send + 'static) -> bool {
        {
            let mut links = self.links.lock();
            if links.sealed {
                warn!("finish called twice on one chain link");
                return false;
            }
            links.on_finish = Some(Box::new(on_finish));
        }

        let Some(mut head) = self.this.upgrade() else {
            return false;
        };
        // Seal backwards to the head; one link locked at a time.
        loop {
            let prev = {
                let mut links = head.links.lock();
                links.sealed = true;
                links.prev.clone()
            };
            match prev.and_then(|weak| weak.upgrade()) {
                Some(predecessor) => head = predecessor,
                None => break,
            }
        }

        let head: TaskRef = head;
        let accepted = crate::core::add_task(head);
        if !accepted {
            error!("chain submission failed: no scheduler connected");
        }
        accepted
    }

    /// Returns true once this link has a pending successor.
    pub fn has_successor(&self) -> bool {
        self.links.lock().next.is_some()
    }

    /// Returns true once the chain containing this link was sealed.
    pub fn is_sealed(&self) -> bool {
        self.links.lock().sealed
    }
}

enum Continuation {
    Submit(Arc<ChainTask>),
    Finish(Box<dyn FnOnce() + Send>),
    Nothing,
}

impl Task for ChainTask {
    fn name(&self) -> &str {
        "chain-task"
    }

    fn execute(&self) -> bool {
        (self.exec)()
    }

    fn task_done(&self) {
        let continuation = {
            let mut links = self.links.lock();
            if let Some(next) = links.next.take() {
                Continuation::Submit(next)
            } else if let Some(on_finish) = links.on_finish.take() {
                Continuation::Finish(on_finish)
            } else {
                Continuation::Nothing
            }
        };
        match continuation {
            Continuation::Submit(next) => {
                let next: TaskRef = next;
                if !crate::core::add_task(next) {
                    error!("chain continuation lost: no scheduler connected");
                }
            }
            Continuation::Finish(on_finish) => on_finish(),
            Continuation::Nothing => {
                warn!("chain link completed with neither successor nor finish callback");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_links_successor_once() {
        let head = ChainTask::new(|| true);
        let second = head.reschedule(|| true);
        assert!(second.is_some());
        assert!(head.has_successor());

        // At most one pending successor per link.
        assert!(head.reschedule(|| true).is_none());
    }

    #[test]
    fn test_finish_seals_every_link() {
        let _bus = crate::core::test_support::lock();
        let head = ChainTask::new(|| true);
        let tail = head.reschedule(|| true).unwrap();

        // No scheduler in this test: submission fails, sealing still happens.
        assert!(!tail.finish(|| {}));
        assert!(head.is_sealed());
        assert!(tail.is_sealed());
        assert!(tail.reschedule(|| true).is_none());
    }

    #[test]
    fn test_terminal_callback_fires_exactly_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let link = ChainTask::new(|| true);
        {
            let mut links = link.links.lock();
            links.on_finish = Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        link.task_done();
        link.task_done(); // callback already consumed
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_twice_is_rejected() {
        let _bus = crate::core::test_support::lock();
        let link = ChainTask::new(|| true);
        link.finish(|| {});
        assert!(!link.finish(|| {}));
    }
}
