//! # Object-scoped signals.
//!
//! [`Signal`] is the object-based counterpart to the type-addressed bus:
//! the event source is a value you own, not an interface type, and
//! callbacks connect to that one value. Useful when a component wants to
//! expose "something happened on *this* instance" without registering a
//! process-wide interface.
//!
//! ## Rules
//! - Callbacks run in connection order.
//! - The signal lock is not held while callbacks run; a callback may
//!   connect or disconnect handlers of the same signal, including its own.
//! - Dropping a [`SignalConnection`] disconnects the callback; dropping
//!   the signal itself disconnects everything (stale guards become no-ops).

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::registry::{SlotId, SlotList};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An event source owned by a single object.
///
/// # Example
/// ```
/// use taskbus::Signal;
///
/// let on_resize: Signal<(u32, u32)> = Signal::new();
/// let conn = on_resize.connect(|&(w, h)| {
///     assert_eq!((w, h), (800, 600));
/// });
///
/// on_resize.dispatch(&(800, 600));
/// drop(conn);
/// on_resize.dispatch(&(1, 1)); // nobody listening
/// ```
pub struct Signal<T> {
    handlers: Arc<Mutex<SlotList<Callback<T>>>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(SlotList::new())),
        }
    }

    /// Connects `f`; it stays connected until the returned guard drops.
    pub fn connect(&self, f: impl Fn(&T) + Send + Sync + 'static) -> SignalConnection<T> {
        let id = self.handlers.lock().push_back(Arc::new(f));
        SignalConnection {
            handlers: Arc::downgrade(&self.handlers),
            id,
        }
    }

    /// Invokes every connected callback with `arg`, in connection order.
    pub fn dispatch(&self, arg: &T) {
        let snapshot: Vec<(SlotId, Callback<T>)> = self
            .handlers
            .lock()
            .iter()
            .map(|(id, cb)| (id, Arc::clone(cb)))
            .collect();
        for (id, callback) in snapshot {
            if self.handlers.lock().contains(id) {
                callback(arg);
            }
        }
    }

    /// Number of connected callbacks. Diagnostics and tests.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

/// Guard for one [`Signal`] callback registration.
pub struct SignalConnection<T> {
    handlers: Weak<Mutex<SlotList<Callback<T>>>>,
    id: SlotId,
}

impl<T> SignalConnection<T> {
    /// Disconnects the callback. Idempotent; returns `false` when it was
    /// already disconnected or the signal is gone.
    pub fn disconnect(&mut self) -> bool {
        match self.handlers.upgrade() {
            Some(handlers) => handlers.lock().remove(self.id).is_some(),
            None => false,
        }
    }
}

impl<T> Drop for SignalConnection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_runs_in_connection_order() {
        let signal: Signal<u32> = Signal::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = log.clone();
        let _a = signal.connect(move |v| first.lock().push(*v));
        let second = log.clone();
        let _b = signal.connect(move |v| second.lock().push(v + 100));

        signal.dispatch(&1);
        assert_eq!(*log.lock(), vec![1, 101]);
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let signal: Signal<()> = Signal::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let mut conn = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.dispatch(&());
        assert!(conn.disconnect());
        assert!(!conn.disconnect());
        signal.dispatch(&());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(signal.handler_count(), 0);
    }

    #[test]
    fn test_guard_outliving_signal_is_harmless() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut conn = {
            let signal: Signal<()> = Signal::new();
            let counter = hits.clone();
            signal.connect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert!(!conn.disconnect());
    }
}
