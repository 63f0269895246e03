//! # GROUP addressing: a priority-ordered handler list per key.
//!
//! [`GroupBus`] maps each numeric key to a list of handlers ordered like
//! the GLOBAL list (descending priority, stable ties). `multicast`
//! delivers to the whole group; `invoke` asks only the group's first
//! handler. The snapshot/re-check dispatch discipline matches
//! [`GlobalBus`](crate::GlobalBus).

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::bus::connection::{Anchor, Connection};
use crate::bus::context::{self, HandlerEntry};
use crate::bus::priority::Priority;
use crate::registry::SlotId;

/// Type-addressed bus in GROUP mode.
///
/// `I` is the interface object type, e.g. `GroupBus<dyn Collider>`.
pub struct GroupBus<I: ?Sized>(PhantomData<fn(&I)>);

impl<I: ?Sized + Send + Sync + 'static> GroupBus<I> {
    /// Connects `handler` under `key`, spliced into the group's
    /// descending-priority order.
    pub fn connect(key: u64, handler: Arc<I>, priority: Priority) -> Connection<I> {
        let ctx = context::context::<I>();
        let id = {
            let mut state = ctx.state.lock();
            let serial = state.take_serial();
            let list = state.groups.entry(key).or_default();
            context::insert_sorted(
                list,
                HandlerEntry {
                    handler,
                    priority: priority.value(),
                    serial,
                },
            )
        };
        debug!(mode = "group", key, priority = priority.value(), "handler connected");
        Connection::new(ctx, Anchor::Group { key, id })
    }

    /// Invokes `f` on every handler of `key`'s group, highest priority
    /// first. A vacant key drops the multicast silently.
    pub fn multicast(key: u64, mut f: impl FnMut(&I)) {
        let ctx = context::context::<I>();
        let entries = Self::snapshot_group(&ctx, key);
        if entries.is_empty() {
            trace!(key, "unaddressed multicast dropped");
            return;
        }
        for (id, handler) in entries {
            let live = ctx
                .state
                .lock()
                .groups
                .get(&key)
                .is_some_and(|list| list.contains(id));
            if live {
                f(&handler);
            }
        }
    }

    /// Invokes `f` on the group's first (highest-priority) handler and
    /// returns its result, or `None` when the key is vacant.
    pub fn invoke<R>(key: u64, f: impl FnOnce(&I) -> R) -> Option<R> {
        let ctx = context::context::<I>();
        let entries = Self::snapshot_group(&ctx, key);
        for (id, handler) in entries {
            let live = ctx
                .state
                .lock()
                .groups
                .get(&key)
                .is_some_and(|list| list.contains(id));
            if live {
                return Some(f(&handler));
            }
        }
        trace!(key, "unaddressed invoke dropped");
        None
    }

    /// Number of handlers in `key`'s group. Diagnostics and tests.
    pub fn handler_count(key: u64) -> usize {
        context::context::<I>()
            .state
            .lock()
            .groups
            .get(&key)
            .map_or(0, |list| list.len())
    }

    fn snapshot_group(
        ctx: &context::BusContext<I>,
        key: u64,
    ) -> Vec<(SlotId, Arc<I>)> {
        let state = ctx.state.lock();
        state
            .groups
            .get(&key)
            .map(context::snapshot)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    trait Listener: Send + Sync {
        fn hear(&self, log: &Mutex<Vec<f32>>);
    }

    struct Tagged(f32);
    impl Listener for Tagged {
        fn hear(&self, log: &Mutex<Vec<f32>>) {
            log.lock().push(self.0);
        }
    }

    type ListenerBus = GroupBus<dyn Listener>;

    #[test]
    fn test_multicast_delivers_in_priority_order() {
        let log = Mutex::new(Vec::new());
        // Connection order 1.0 then 2.0; delivery must be 2.0 first.
        let _low = ListenerBus::connect(5, Arc::new(Tagged(1.0)), Priority::new(1.0));
        let _high = ListenerBus::connect(5, Arc::new(Tagged(2.0)), Priority::new(2.0));

        ListenerBus::multicast(5, |h| h.hear(&log));
        assert_eq!(*log.lock(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_groups_are_isolated_by_key() {
        let log = Mutex::new(Vec::new());
        let _a = ListenerBus::connect(21, Arc::new(Tagged(1.0)), Priority::default());
        let _b = ListenerBus::connect(22, Arc::new(Tagged(2.0)), Priority::default());

        ListenerBus::multicast(21, |h| h.hear(&log));
        assert_eq!(*log.lock(), vec![1.0]);
    }

    #[test]
    fn test_invoke_hits_highest_priority_only() {
        trait Pick: Send + Sync {
            fn value(&self) -> u32;
        }
        struct Fixed(u32);
        impl Pick for Fixed {
            fn value(&self) -> u32 {
                self.0
            }
        }

        let _a = GroupBus::<dyn Pick>::connect(3, Arc::new(Fixed(10)), Priority::new(1.0));
        let _b = GroupBus::<dyn Pick>::connect(3, Arc::new(Fixed(20)), Priority::new(9.0));

        assert_eq!(GroupBus::<dyn Pick>::invoke(3, |h| h.value()), Some(20));
        assert_eq!(GroupBus::<dyn Pick>::invoke(4, |h| h.value()), None);
    }

    #[test]
    fn test_empty_group_is_removed_from_registry() {
        let mut conn = ListenerBus::connect(30, Arc::new(Tagged(0.0)), Priority::default());
        assert_eq!(ListenerBus::handler_count(30), 1);
        conn.disconnect();
        assert_eq!(ListenerBus::handler_count(30), 0);
        ListenerBus::multicast(30, |_h| {});
    }
}
