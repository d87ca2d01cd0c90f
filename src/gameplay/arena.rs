//! Arena setup and player input: the walled battlefield, the player's
//! vessel with its cursor-steered turret, the opening enemy spread, and the
//! systems translating raw input into movement and aim.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::gameplay::actors::{ActorKind, mount_turret, player_salvo, spawn_actor};
use crate::gameplay::combat::bars::HealthBarConfig;
use crate::gameplay::combat::turret::{AimCursor, Turret};
use crate::gameplay::registry::{Actor, CombatRegistry, Obstacle};
use crate::gameplay::{Facing, Health, Player, Pushable, SlowEffect, Team};
use crate::theme::palette;
use crate::third_party::CollisionLayer;
use crate::{GameSet, GameState, Z_ACTOR, Z_OBSTACLE, gameplay_running};

// === Constants ===

const ARENA_HALF_WIDTH: f32 = 480.0;
const ARENA_HALF_HEIGHT: f32 = 320.0;
const WALL_THICKNESS: f32 = 24.0;

const PLAYER_MAX_HEALTH: f32 = 120.0;
const PLAYER_RADIUS: f32 = 14.0;
const PLAYER_SPEED: f32 = 160.0;

// === Setup ===

fn spawn_wall(commands: &mut Commands, position: Vec2, size: Vec2) {
    commands.spawn((
        Name::new("Wall"),
        Obstacle,
        Sprite::from_color(palette::OBSTACLE, size),
        Transform::from_translation(position.extend(Z_OBSTACLE)),
        RigidBody::Static,
        Collider::rectangle(size.x, size.y),
        CollisionLayers::new(
            CollisionLayer::Obstacle,
            [CollisionLayer::Pushbox, CollisionLayer::Hitbox],
        ),
        DespawnOnExit(GameState::InGame),
    ));
}

fn spawn_player(commands: &mut Commands, position: Vec2) -> Entity {
    let vessel = commands
        .spawn((
            Name::new("Player"),
            Player,
            Actor,
            Team::PLAYER,
            Facing::default(),
            Health::new(PLAYER_MAX_HEALTH),
            HealthBarConfig {
                width: 28.0,
                height: 3.0,
                y_offset: PLAYER_RADIUS + 6.0,
            },
            Pushable,
            Sprite::from_color(
                palette::team_tint(Team::PLAYER).unwrap_or(palette::PROJECTILE),
                Vec2::splat(PLAYER_RADIUS * 2.0),
            ),
            Transform::from_translation(position.extend(Z_ACTOR)),
            (
                RigidBody::Dynamic,
                Collider::circle(PLAYER_RADIUS),
                CollisionLayers::new(
                    [CollisionLayer::Pushbox, CollisionLayer::Hurtbox],
                    [
                        CollisionLayer::Pushbox,
                        CollisionLayer::Hitbox,
                        CollisionLayer::Obstacle,
                    ],
                ),
                LockedAxes::ROTATION_LOCKED,
                LinearVelocity::ZERO,
                CollidingEntities::default(),
            ),
            DespawnOnExit(GameState::InGame),
        ))
        .id();

    mount_turret(
        commands,
        vessel,
        Team::PLAYER,
        Turret {
            rotation_speed: 360.0,
            basic_direction: 0.0,
            range: 600.0,
        },
        None,
        true,
        player_salvo(),
        0.0,
    );
    vessel
}

/// Builds the battlefield when gameplay starts.
fn setup_arena(mut commands: Commands, time: Res<Time>) {
    let now = time.elapsed_secs();

    let horizontal = Vec2::new(ARENA_HALF_WIDTH * 2.0 + WALL_THICKNESS * 2.0, WALL_THICKNESS);
    let vertical = Vec2::new(WALL_THICKNESS, ARENA_HALF_HEIGHT * 2.0);
    spawn_wall(
        &mut commands,
        Vec2::new(0.0, ARENA_HALF_HEIGHT + WALL_THICKNESS / 2.0),
        horizontal,
    );
    spawn_wall(
        &mut commands,
        Vec2::new(0.0, -ARENA_HALF_HEIGHT - WALL_THICKNESS / 2.0),
        horizontal,
    );
    spawn_wall(
        &mut commands,
        Vec2::new(ARENA_HALF_WIDTH + WALL_THICKNESS / 2.0, 0.0),
        vertical,
    );
    spawn_wall(
        &mut commands,
        Vec2::new(-ARENA_HALF_WIDTH - WALL_THICKNESS / 2.0, 0.0),
        vertical,
    );

    spawn_player(&mut commands, Vec2::new(0.0, -ARENA_HALF_HEIGHT * 0.6));

    spawn_actor(
        &mut commands,
        ActorKind::Sentry,
        Vec2::new(0.0, ARENA_HALF_HEIGHT * 0.7),
        Team(2),
        now,
    );
    spawn_actor(
        &mut commands,
        ActorKind::Gunship,
        Vec2::new(ARENA_HALF_WIDTH * 0.5, ARENA_HALF_HEIGHT * 0.4),
        Team(2),
        now,
    );
    for x in [-120.0, -60.0, 60.0] {
        spawn_actor(
            &mut commands,
            ActorKind::Drone,
            Vec2::new(x, ARENA_HALF_HEIGHT * 0.3),
            Team(2),
            now,
        );
    }
}

// === Input ===

/// Projects the window cursor into world space and samples the fire button.
fn update_aim_cursor(
    mut cursor: ResMut<AimCursor>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    buttons: Res<ButtonInput<MouseButton>>,
) {
    cursor.fire_held = buttons.pressed(MouseButton::Left);
    cursor.position = windows
        .single()
        .ok()
        .and_then(|window| window.cursor_position())
        .and_then(|viewport_pos| {
            let (camera, camera_transform) = cameras.single().ok()?;
            camera.viewport_to_world_2d(camera_transform, viewport_pos).ok()
        });
}

/// WASD movement, scaled down by the strongest slow effect among entities
/// currently touching the player.
fn move_player(
    keyboard: Res<ButtonInput<KeyCode>>,
    registry: Res<CombatRegistry>,
    slows: Query<&SlowEffect>,
    mut players: Query<&mut LinearVelocity, With<Player>>,
) {
    let Ok(mut velocity) = players.single_mut() else {
        return;
    };

    let mut direction = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        direction.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        direction.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        direction.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        direction.x += 1.0;
    }

    let slow = registry.highest_slow_factor(|entity| slows.get(entity).map(|s| s.0).ok());
    velocity.0 = direction.normalize_or_zero() * PLAYER_SPEED * slow;
}

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), setup_arena);
    app.add_systems(
        Update,
        (update_aim_cursor, move_player)
            .in_set(GameSet::Input)
            .run_if(gameplay_running),
    );
}
