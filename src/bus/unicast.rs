//! # ONE2ONE addressing: one handler per key.
//!
//! [`UnicastBus`] maps each numeric key to at most one handler. Claiming
//! an occupied key fails; dispatch against a vacant key is silently
//! dropped (decoupling, not an error). Dispatch never holds the context
//! lock while the handler body runs.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::bus::connection::{Anchor, Connection};
use crate::bus::context::{self, HandlerEntry};
use crate::error::BusError;

/// Type-addressed bus in ONE2ONE mode.
///
/// `I` is the interface object type, e.g. `UnicastBus<dyn Display>`.
/// Like [`GlobalBus`](crate::GlobalBus) the type is pure namespace; only
/// the keyed verbs exist on it.
pub struct UnicastBus<I: ?Sized>(PhantomData<fn(&I)>);

impl<I: ?Sized + Send + Sync + 'static> UnicastBus<I> {
    /// Claims `key` for `handler`.
    ///
    /// Fails with [`BusError::KeyTaken`] when the key already has an
    /// occupant; the existing registration is left untouched.
    pub fn connect(key: u64, handler: Arc<I>) -> Result<Connection<I>, BusError> {
        let ctx = context::context::<I>();
        let serial = {
            let mut state = ctx.state.lock();
            if state.keyed.contains_key(&key) {
                return Err(BusError::KeyTaken { key });
            }
            let serial = state.take_serial();
            state.keyed.insert(
                key,
                HandlerEntry {
                    handler,
                    priority: 0.0,
                    serial,
                },
            );
            serial
        };
        debug!(mode = "one2one", key, "handler connected");
        Ok(Connection::new(ctx, Anchor::Keyed { key, serial }))
    }

    /// Delivers `f` to the handler registered under `key`, if any.
    ///
    /// A vacant key drops the event silently.
    pub fn event(key: u64, f: impl FnOnce(&I)) {
        match Self::lookup(key) {
            Some(handler) => f(&handler),
            None => trace!(key, "unaddressed event dropped"),
        }
    }

    /// Delivers `f` to the handler under `key` and returns its result,
    /// or `None` when the key is vacant.
    pub fn invoke<R>(key: u64, f: impl FnOnce(&I) -> R) -> Option<R> {
        match Self::lookup(key) {
            Some(handler) => Some(f(&handler)),
            None => {
                trace!(key, "unaddressed invoke dropped");
                None
            }
        }
    }

    /// Returns true while `key` has a registered handler.
    pub fn is_registered(key: u64) -> bool {
        context::context::<I>().state.lock().keyed.contains_key(&key)
    }

    /// Number of claimed keys. Diagnostics and tests.
    pub fn handler_count() -> usize {
        context::context::<I>().state.lock().keyed.len()
    }

    fn lookup(key: u64) -> Option<Arc<I>> {
        let ctx = context::context::<I>();
        let state = ctx.state.lock();
        state.keyed.get(&key).map(|entry| Arc::clone(&entry.handler))
    }
}
