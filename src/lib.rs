//! Broadside — the combat resolution and targeting core of a top-down
//! action game: projectiles, break rules, damage, turret aiming, and the
//! salvo reload economy.

pub mod game;
pub mod gameplay;
pub mod prelude;
#[cfg(test)]
pub mod testing;
pub mod theme;
pub mod third_party;

#[cfg(feature = "dev")]
pub mod dev_tools;

use bevy::prelude::*;

// === Z Layers ===

/// Z layer for obstacle sprites.
pub const Z_OBSTACLE: f32 = 1.0;

/// Z layer for actors (vessels, drones, emplacements).
pub const Z_ACTOR: f32 = 2.0;

/// Z layer for projectiles (drawn above actors).
pub const Z_PROJECTILE: f32 = 3.0;

// === States ===

/// Primary game states.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Initial loading state.
    #[default]
    Loading,
    /// Active gameplay state.
    InGame,
}

// === System Sets ===

/// Ordered system sets for one simulation tick. Configured as a chain in
/// [`game::plugin`]: input feeds targeting, targeting feeds combat, combat
/// feeds damage resolution, and cleanup despawns what the tick destroyed.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    /// Input boundary (cursor aim, debug spawners).
    Input,
    /// Registry bookkeeping (touching-player contacts).
    Registry,
    /// Target acquisition and turret rotation.
    Targeting,
    /// Weapon fire and projectile movement/collision.
    Combat,
    /// Health evaluation, destruction, team propagation.
    Damage,
    /// End-of-tick despawns and feedback sinks.
    Cleanup,
    /// Observational UI (health/reload bars).
    Ui,
}

/// Run condition for all simulation systems.
///
/// Returns `true` when no state machine exists (headless test apps built on
/// `MinimalPlugins`) so systems under test run unconditionally.
pub fn gameplay_running(state: Option<Res<State<GameState>>>) -> bool {
    state.is_none_or(|state| *state.get() == GameState::InGame)
}
