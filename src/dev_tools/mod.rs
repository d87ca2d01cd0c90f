//! Development tools — only included with `cargo run --features dev`.
//!
//! Debug spawners and inspector setup go here. This module is stripped
//! from release builds.

use bevy::prelude::*;
use rand::Rng;

use crate::gameplay::actors::{ActorKind, spawn_actor};
use crate::gameplay::Team;
use crate::{GameSet, GameState};

/// Number of drones spawned per E key press.
const DRONES_PER_SPAWN: u32 = 3;

/// Debug spawns appear this far from the arena center.
const DEBUG_SPAWN_RADIUS: f32 = 200.0;

fn debug_spawn_enemies(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut commands: Commands,
) {
    let mut rng = rand::rng();
    let now = time.elapsed_secs();

    if keyboard.just_pressed(KeyCode::KeyE) {
        for _ in 0..DRONES_PER_SPAWN {
            let position = Vec2::new(
                rng.random_range(-DEBUG_SPAWN_RADIUS..=DEBUG_SPAWN_RADIUS),
                rng.random_range(0.0..=DEBUG_SPAWN_RADIUS),
            );
            spawn_actor(&mut commands, ActorKind::Drone, position, Team(2), now);
        }
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        spawn_actor(
            &mut commands,
            ActorKind::Gunship,
            Vec2::new(0.0, DEBUG_SPAWN_RADIUS),
            Team(2),
            now,
        );
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        debug_spawn_enemies
            .in_set(GameSet::Input)
            .run_if(in_state(GameState::InGame)),
    );
}
