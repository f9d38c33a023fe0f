//! Pure rules of the repeated chicken game.
//!
//! Nothing here touches storage or time. The engine crate persists what
//! these functions return.
//!
//! - [`Choice`] — the binary move a player submits each round
//! - [`Phase`] — stage derived from the round number
//! - [`Matrix`] — payoff lookup, with [`Chicken`] as the classroom default
//! - [`shuffle`] / [`opponent`] — fixed-opponent pairing combinatorics
//! - [`deal`] — indicator symbols for the late rounds
//! - [`code`] — human-enterable join codes
mod choice;
mod indicator;
mod matrix;
mod pairing;
mod phase;

pub mod code;

pub use choice::*;
pub use indicator::*;
pub use matrix::*;
pub use pairing::*;
pub use phase::*;
