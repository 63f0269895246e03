//! Error types used by the bus registries.
//!
//! Protocol violations on the bus surface as plain values rather than
//! panics: keyed registration conflicts return [`BusError`], disconnect
//! mismatches return `false`, unaddressed dispatch is a silent no-op and
//! a double reschedule yields `None`. See the module docs of
//! [`GlobalBus`](crate::GlobalBus) and [`ChainTask`](crate::ChainTask)
//! for those contracts.

use thiserror::Error;

/// # Errors produced by bus registration.
///
/// Dispatch itself never fails; only claiming a slot in a registry can.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// A ONE2ONE key already has a registered handler.
    #[error("key {key} already has a registered handler")]
    KeyTaken {
        /// The contested key.
        key: u64,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskbus::BusError;
    ///
    /// let err = BusError::KeyTaken { key: 5 };
    /// assert_eq!(err.as_label(), "bus_key_taken");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::KeyTaken { .. } => "bus_key_taken",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::KeyTaken { key } => format!("registration conflict on key {key}"),
        }
    }
}
