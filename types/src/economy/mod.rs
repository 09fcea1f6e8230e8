//! Economy domain types.
//!
//! Defines the player record, reward ledger, pricing/verification
//! configuration, and the bounded per-mode leaderboards used by the execution
//! layer and clients.

mod codec;
mod config;
mod constants;
mod leaderboard;
mod ledger;
mod player;
mod verification;

pub use codec::{read_string, string_encode_size, write_string};
pub use config::*;
pub use constants::*;
pub use leaderboard::*;
pub use ledger::*;
pub use player::*;
pub use verification::*;
