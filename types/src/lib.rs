//! Shared types for the reflex game economy: the wire format for signed
//! transactions and permits, the state keys and values the execution layer
//! persists, and the economy domain model itself.

pub mod economy;
pub mod execution;

pub use execution::{
    permit_namespace, transaction_namespace, Account, Event, Instruction, Key, LegacySource,
    Output, ScorePermit, Transaction, Value, NAMESPACE,
};
