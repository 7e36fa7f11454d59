//! Core data types for the stablecoin yield bot.

pub mod rate;
pub mod state;

pub use rate::*;
pub use state::*;
