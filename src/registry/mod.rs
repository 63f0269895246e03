//! Allocation-free membership structures shared by the bus registries.
//!
//! The only public-in-crate type is [`SlotList`], an arena-backed doubly
//! linked list addressed by generation-checked [`SlotId`] handles. Handler
//! registries and signal handler lists are built on it.

mod slots;

pub(crate) use slots::{SlotId, SlotList};
