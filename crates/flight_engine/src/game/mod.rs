//! # Game Rules
//!
//! Input flags, the game-state machine and the player's health and score.
//! The frame driver in [`crate::engine`] owns one of each and feeds them
//! every tick.

pub mod input;
pub mod state;

pub use input::{FrameInput, InputActions};
pub use state::{GameState, PlayerStatus};
