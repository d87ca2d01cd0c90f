//! Common imports for the entire crate.

pub use bevy::prelude::*;

pub use crate::gameplay::{Facing, Health, Player, Pushable, Team};
pub use crate::{GameSet, GameState, gameplay_running};
