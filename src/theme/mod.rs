//! Visual constants shared across the game.

pub mod palette;
