//! Typed publish/subscribe core.
//!
//! One interface type, one process-wide context, three addressing modes:
//! - [`GlobalBus`]: every connected handler hears every dispatch;
//! - [`UnicastBus`]: one handler per numeric key;
//! - [`GroupBus`]: a priority-ordered handler list per numeric key.
//!
//! The mode is part of the bus *type*, so calling a verb that does not
//! belong to the mode is a compile error, not a runtime check.
//! [`Signal`] is the object-scoped complement for per-instance events.

mod connection;
mod context;
mod global;
mod group;
mod priority;
mod signal;
mod unicast;

pub use connection::Connection;
pub use global::GlobalBus;
pub use group::GroupBus;
pub use priority::Priority;
pub use signal::{Signal, SignalConnection};
pub use unicast::UnicastBus;
