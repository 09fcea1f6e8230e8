//! Reflex execution layer.
//!
//! This crate contains the deterministic transaction execution logic
//! ([`Layer`]) for the reflex game economy: turn metering, score settlement
//! and reward minting, daily claims, leaderboards, and the one-time legacy
//! balance migration.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; time is derived from the
//!   view of the state transition being executed.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! Each batch of transactions is executed against a buffered overlay and
//! committed atomically: a rejected operation emits an error event and stages
//! no writes.

pub mod queries;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::{Layer, OWNER_PUBLIC_KEY_ENV, SECONDS_PER_VIEW};
pub use state::{Adb, PrepareError, State, Status};

#[cfg(any(test, feature = "mocks"))]
pub use state::Memory;

#[cfg(test)]
mod admin_tests;
#[cfg(test)]
mod permit_tests;
