//! # Per-interface bus context.
//!
//! Every interface type `I` gets exactly one [`BusContext`], created
//! lazily on first access and kept for the lifetime of the process. The
//! context owns all three addressing structures under a single lock:
//!
//! ```text
//! contexts: TypeId ──► BusContext<I>
//!                        ├─ broadcast: SlotList<entry>            (GLOBAL)
//!                        ├─ keyed:     HashMap<key, entry>        (ONE2ONE)
//!                        └─ groups:    HashMap<key, SlotList>     (GROUP)
//! ```
//!
//! ## Rules
//! - Registry mutation only happens with the context lock held.
//! - Dispatch reads a snapshot under the lock, releases it, then invokes
//!   handler bodies; see the bus modules for the re-check discipline.
//! - Each registered entry carries a serial number unique within its
//!   context; ONE2ONE disconnection uses it to reject stale guards after
//!   a key has been reused.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::registry::{SlotId, SlotList};

/// A registered handler plus its delivery metadata.
pub(crate) struct HandlerEntry<I: ?Sized> {
    pub(crate) handler: Arc<I>,
    pub(crate) priority: f32,
    pub(crate) serial: u64,
}

/// The three registries of one interface, guarded by one lock.
pub(crate) struct ContextState<I: ?Sized> {
    pub(crate) broadcast: SlotList<HandlerEntry<I>>,
    pub(crate) keyed: HashMap<u64, HandlerEntry<I>>,
    pub(crate) groups: HashMap<u64, SlotList<HandlerEntry<I>>>,
    next_serial: u64,
}

impl<I: ?Sized> ContextState<I> {
    fn new() -> Self {
        Self {
            broadcast: SlotList::new(),
            keyed: HashMap::new(),
            groups: HashMap::new(),
            next_serial: 0,
        }
    }

    pub(crate) fn take_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }
}

/// Process-lifetime registry context for one interface type.
pub(crate) struct BusContext<I: ?Sized + Send + Sync + 'static> {
    pub(crate) state: Mutex<ContextState<I>>,
}

impl<I: ?Sized + Send + Sync + 'static> BusContext<I> {
    fn new() -> Self {
        Self {
            state: Mutex::new(ContextState::new()),
        }
    }
}

/// Inserts `entry` into `list` keeping descending priority order with a
/// stable tie-break: the first position whose priority is strictly lower
/// than the newcomer's is the insertion point, otherwise append.
pub(crate) fn insert_sorted<I: ?Sized>(
    list: &mut SlotList<HandlerEntry<I>>,
    entry: HandlerEntry<I>,
) -> SlotId {
    let anchor = list
        .iter()
        .find(|(_, existing)| entry.priority > existing.priority)
        .map(|(id, _)| id);
    match anchor {
        Some(id) => list.insert_before(id, entry),
        None => list.push_back(entry),
    }
}

/// Snapshot of a priority-ordered list: ids plus handler clones, taken
/// under the context lock so dispatch can run without holding it.
pub(crate) fn snapshot<I: ?Sized>(list: &SlotList<HandlerEntry<I>>) -> Vec<(SlotId, Arc<I>)> {
    list.iter()
        .map(|(id, entry)| (id, Arc::clone(&entry.handler)))
        .collect()
}

static CONTEXTS: OnceLock<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = OnceLock::new();

/// Returns the context of interface `I`, creating it on first access.
pub(crate) fn context<I: ?Sized + Send + Sync + 'static>() -> Arc<BusContext<I>> {
    let contexts = CONTEXTS.get_or_init(DashMap::new);
    let any: Arc<dyn Any + Send + Sync> = {
        let entry = contexts
            .entry(TypeId::of::<I>())
            .or_insert_with(|| Arc::new(BusContext::<I>::new()));
        Arc::clone(entry.value())
    };
    match any.downcast::<BusContext<I>>() {
        Ok(ctx) => ctx,
        Err(_) => unreachable!("bus context is stored under its own interface TypeId"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Probe: Send + Sync {}
    struct Unit;
    impl Probe for Unit {}

    fn entry(priority: f32, serial: u64) -> HandlerEntry<dyn Probe> {
        HandlerEntry {
            handler: Arc::new(Unit),
            priority,
            serial,
        }
    }

    #[test]
    fn test_insert_sorted_orders_descending() {
        let mut list = SlotList::new();
        insert_sorted(&mut list, entry(1.0, 0));
        insert_sorted(&mut list, entry(3.0, 1));
        insert_sorted(&mut list, entry(2.0, 2));

        let priorities: Vec<f32> = list.iter().map(|(_, e)| e.priority).collect();
        assert_eq!(priorities, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_insert_sorted_appends_equal_priority_after_peers() {
        let mut list = SlotList::new();
        insert_sorted(&mut list, entry(1.0, 0));
        insert_sorted(&mut list, entry(1.0, 1));
        insert_sorted(&mut list, entry(1.0, 2));

        let serials: Vec<u64> = list.iter().map(|(_, e)| e.serial).collect();
        assert_eq!(serials, vec![0, 1, 2]);
    }

    #[test]
    fn test_context_is_shared_per_interface() {
        let a = context::<dyn Probe>();
        let b = context::<dyn Probe>();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
