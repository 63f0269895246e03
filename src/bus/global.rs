//! # GLOBAL addressing: every connected handler hears every dispatch.
//!
//! [`GlobalBus`] is the unkeyed mode. All handlers of an interface sit in
//! one priority-ordered list; `broadcast` visits all of them and `invoke`
//! asks only the first (highest-priority) one for a result.
//!
//! ## Dispatch discipline
//! The handler list is snapshotted under the context lock, then the lock
//! is released and each entry is re-checked for connectivity immediately
//! before its callback runs:
//!
//! ```text
//! lock ── snapshot (id, handler)* ── unlock
//!   for each entry:
//!     lock ── still connected? ── unlock
//!     yes: run handler body (no bus lock held)
//! ```
//!
//! A handler body may therefore call back into the bus, including
//! disconnecting itself, without deadlocking. What it must not assume is
//! that it is still connected once its callback returns. Handlers that
//! connect while a dispatch is in flight are not visited until the next
//! dispatch.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::bus::connection::{Anchor, Connection};
use crate::bus::context::{self, HandlerEntry};
use crate::bus::priority::Priority;

/// Type-addressed bus in GLOBAL mode.
///
/// `I` is the interface object type, e.g. `GlobalBus<dyn Renderer>`.
/// The type is never instantiated; it only namespaces the operations of
/// one interface, so the wrong verb for the mode simply does not exist.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use taskbus::{GlobalBus, Priority};
///
/// trait Logger: Send + Sync {
///     fn log(&self, line: &str);
/// }
///
/// struct Stdout;
/// impl Logger for Stdout {
///     fn log(&self, _line: &str) {}
/// }
///
/// type LogBus = GlobalBus<dyn Logger>;
///
/// let _conn = LogBus::connect(Arc::new(Stdout), Priority::default());
/// LogBus::broadcast(|l| l.log("hello"));
/// ```
pub struct GlobalBus<I: ?Sized>(PhantomData<fn(&I)>);

impl<I: ?Sized + Send + Sync + 'static> GlobalBus<I> {
    /// Connects `handler` to the unkeyed list of this interface.
    ///
    /// The handler is spliced into descending-priority order; equal
    /// priorities keep connection order. The registration lives until the
    /// returned guard is dropped or disconnected.
    pub fn connect(handler: Arc<I>, priority: Priority) -> Connection<I> {
        let ctx = context::context::<I>();
        let id = {
            let mut state = ctx.state.lock();
            let serial = state.take_serial();
            context::insert_sorted(
                &mut state.broadcast,
                HandlerEntry {
                    handler,
                    priority: priority.value(),
                    serial,
                },
            )
        };
        debug!(mode = "global", priority = priority.value(), "handler connected");
        Connection::new(ctx, Anchor::Broadcast(id))
    }

    /// Invokes `f` on every connected handler, highest priority first.
    pub fn broadcast(mut f: impl FnMut(&I)) {
        let ctx = context::context::<I>();
        let entries = context::snapshot(&ctx.state.lock().broadcast);
        for (id, handler) in entries {
            if ctx.state.lock().broadcast.contains(id) {
                f(&handler);
            }
        }
    }

    /// Invokes `f` on the first (highest-priority) connected handler and
    /// returns its result, or `None` when no handler is connected.
    pub fn invoke<R>(f: impl FnOnce(&I) -> R) -> Option<R> {
        let ctx = context::context::<I>();
        let entries = context::snapshot(&ctx.state.lock().broadcast);
        for (id, handler) in entries {
            if ctx.state.lock().broadcast.contains(id) {
                return Some(f(&handler));
            }
        }
        None
    }

    /// Number of currently connected handlers. Diagnostics and tests.
    pub fn handler_count() -> usize {
        context::context::<I>().state.lock().broadcast.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Recorder: Send + Sync {
        fn record(&self, log: &Mutex<Vec<u32>>);
        fn answer(&self) -> u32;
    }

    struct Tagged(u32);
    impl Recorder for Tagged {
        fn record(&self, log: &Mutex<Vec<u32>>) {
            log.lock().push(self.0);
        }
        fn answer(&self) -> u32 {
            self.0
        }
    }

    type RecorderBus = GlobalBus<dyn Recorder>;

    #[test]
    fn test_broadcast_visits_by_descending_priority() {
        let log = Mutex::new(Vec::new());
        let _low = RecorderBus::connect(Arc::new(Tagged(1)), Priority::new(1.0));
        let _high = RecorderBus::connect(Arc::new(Tagged(2)), Priority::new(2.0));
        let _mid = RecorderBus::connect(Arc::new(Tagged(3)), Priority::new(1.5));

        RecorderBus::broadcast(|h| h.record(&log));
        assert_eq!(*log.lock(), vec![2, 3, 1]);
    }

    #[test]
    fn test_invoke_reaches_only_first_handler() {
        trait Lone: Send + Sync {
            fn value(&self) -> u32;
        }
        struct Fixed(u32);
        impl Lone for Fixed {
            fn value(&self) -> u32 {
                self.0
            }
        }

        assert_eq!(GlobalBus::<dyn Lone>::invoke(|h| h.value()), None);

        let _a = GlobalBus::<dyn Lone>::connect(Arc::new(Fixed(7)), Priority::new(1.0));
        let _b = GlobalBus::<dyn Lone>::connect(Arc::new(Fixed(9)), Priority::new(2.0));
        assert_eq!(GlobalBus::<dyn Lone>::invoke(|h| h.value()), Some(9));
    }

    #[test]
    fn test_disconnected_handler_is_not_visited() {
        trait Count: Send + Sync {
            fn bump(&self);
        }
        struct Counter(AtomicUsize);
        impl Count for Counter {
            fn bump(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut conn =
            GlobalBus::<dyn Count>::connect(counter.clone(), Priority::default());

        GlobalBus::<dyn Count>::broadcast(|h| h.bump());
        assert!(conn.disconnect());
        GlobalBus::<dyn Count>::broadcast(|h| h.bump());

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(!conn.disconnect());
        assert_eq!(GlobalBus::<dyn Count>::handler_count(), 0);
    }

    #[test]
    fn test_handler_may_disconnect_itself_mid_broadcast() {
        trait SelfRemove: Send + Sync {
            fn fire(&self);
        }
        struct OneShot {
            conn: Mutex<Option<Connection<dyn SelfRemove>>>,
            fired: AtomicUsize,
        }
        impl SelfRemove for OneShot {
            fn fire(&self) {
                self.fired.fetch_add(1, Ordering::SeqCst);
                if let Some(mut conn) = self.conn.lock().take() {
                    conn.disconnect();
                }
            }
        }

        let handler = Arc::new(OneShot {
            conn: Mutex::new(None),
            fired: AtomicUsize::new(0),
        });
        let conn = GlobalBus::<dyn SelfRemove>::connect(handler.clone(), Priority::default());
        *handler.conn.lock() = Some(conn);

        GlobalBus::<dyn SelfRemove>::broadcast(|h| h.fire());
        GlobalBus::<dyn SelfRemove>::broadcast(|h| h.fire());
        assert_eq!(handler.fired.load(Ordering::SeqCst), 1);
    }
}
