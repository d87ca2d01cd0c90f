//! Core game plugin: states, system-set ordering, and the global camera.

use bevy::prelude::*;

use crate::{GameSet, GameState};

pub fn plugin(app: &mut App) {
    app.init_state::<GameState>();

    app.configure_sets(
        Update,
        (
            GameSet::Input,
            GameSet::Registry,
            GameSet::Targeting,
            GameSet::Combat,
            GameSet::Damage,
            GameSet::Cleanup,
            GameSet::Ui,
        )
            .chain(),
    );

    app.add_systems(Startup, setup_camera);
    app.add_systems(OnEnter(GameState::Loading), finish_loading);
}

/// Spawns the global 2D camera. Persists across all states (do NOT add `DespawnOnExit`).
fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// No assets to stream yet — enter gameplay immediately.
fn finish_loading(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::InGame);
}
