//! # Registration guard.
//!
//! [`Connection`] ties a handler's registration to a value: dropping the
//! guard disconnects the handler, so a registry can never hold an entry
//! whose owner is gone. This is the ownership-inverted rendition of
//! "destruction implies disconnection".
//!
//! ## Rules
//! - `disconnect` is idempotent; the second call (and any call after the
//!   guard already disconnected) returns `false`.
//! - A ONE2ONE guard only evicts the entry it registered: if the key was
//!   freed and reclaimed by another handler, the stale guard's serial no
//!   longer matches and `disconnect` returns `false` without touching the
//!   current occupant.
//! - Disconnecting the last member of a GROUP key removes the key's list
//!   from the registry.

use std::sync::Arc;

use tracing::debug;

use crate::bus::context::BusContext;
use crate::registry::SlotId;

pub(crate) enum Anchor {
    Broadcast(SlotId),
    Keyed { key: u64, serial: u64 },
    Group { key: u64, id: SlotId },
}

/// Guard representing one live handler registration.
///
/// Returned by the `connect` methods of the three bus types. The handler
/// stays registered until [`Connection::disconnect`] is called or the
/// guard is dropped.
pub struct Connection<I: ?Sized + Send + Sync + 'static> {
    ctx: Arc<BusContext<I>>,
    anchor: Option<Anchor>,
}

impl<I: ?Sized + Send + Sync + 'static> Connection<I> {
    pub(crate) fn new(ctx: Arc<BusContext<I>>, anchor: Anchor) -> Self {
        Self {
            ctx,
            anchor: Some(anchor),
        }
    }

    /// Returns true while this guard still holds a registration.
    pub fn is_connected(&self) -> bool {
        self.anchor.is_some()
    }

    /// Removes the registration this guard holds.
    ///
    /// Returns `false` when there is nothing to remove: the guard already
    /// disconnected, or (ONE2ONE) the key's current occupant is not the
    /// entry this guard registered.
    pub fn disconnect(&mut self) -> bool {
        let Some(anchor) = self.anchor.take() else {
            return false;
        };
        let mut state = self.ctx.state.lock();
        match anchor {
            Anchor::Broadcast(id) => {
                let removed = state.broadcast.remove(id).is_some();
                debug!(mode = "global", removed, "handler disconnected");
                removed
            }
            Anchor::Keyed { key, serial } => {
                let matches = state
                    .keyed
                    .get(&key)
                    .is_some_and(|entry| entry.serial == serial);
                if matches {
                    state.keyed.remove(&key);
                }
                debug!(mode = "one2one", key, removed = matches, "handler disconnected");
                matches
            }
            Anchor::Group { key, id } => {
                let removed = match state.groups.get_mut(&key) {
                    Some(list) => {
                        let removed = list.remove(id).is_some();
                        if list.is_empty() {
                            state.groups.remove(&key);
                        }
                        removed
                    }
                    None => false,
                };
                debug!(mode = "group", key, removed, "handler disconnected");
                removed
            }
        }
    }
}

impl<I: ?Sized + Send + Sync + 'static> Drop for Connection<I> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<I: ?Sized + Send + Sync + 'static> std::fmt::Debug for Connection<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}
