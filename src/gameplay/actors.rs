//! Actor archetypes: stat tables and spawn functions for combat vessels.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::gameplay::combat::bars::{HealthBarConfig, ReloadBarConfig};
use crate::gameplay::combat::factory::ProjectileKind;
use crate::gameplay::combat::salvo::{
    FireCommand, Gun, ReloadPolicy, SalvoDefinition, SalvoState, ShotDef, SpreadPolicy,
};
use crate::gameplay::combat::turret::{CursorSteered, RotationLimits, Turret, TurretState};
use crate::gameplay::combat::FiredBy;
use crate::gameplay::feedback::SoundKind;
use crate::gameplay::registry::{Actor, CombatRegistry, nearest_within};
use crate::gameplay::{Facing, Health, Pushable, SlowEffect, Team};
use crate::theme::palette;
use crate::third_party::CollisionLayer;
use crate::{GameSet, GameState, Z_ACTOR, gameplay_running};

// === Constants ===

const ACTOR_HEALTH_BAR_WIDTH: f32 = 24.0;
const ACTOR_HEALTH_BAR_HEIGHT: f32 = 3.0;

// === Kinds ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ActorKind {
    /// Small rammer. No guns; its hull slows whatever it touches.
    Drone,
    /// Rocket platform with a free-spinning turret.
    Gunship,
    /// Static emplacement with a limited-arc spread gun.
    Sentry,
}

/// Drives a hull straight at the nearest hostile. How drones close in to
/// ram; armed kinds hold position and let their turret work.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Seeker {
    /// Cruise speed, units per second.
    pub speed: f32,
    /// Prey beyond this distance is ignored; the hull drifts to a stop.
    pub range: f32,
}

/// Hull stats per kind.
#[derive(Debug, Clone, Copy)]
pub struct ActorStats {
    pub max_health: f32,
    pub radius: f32,
    /// Slow multiplier applied to the player on contact, if any.
    pub slow_effect: Option<f32>,
    pub seeker: Option<Seeker>,
}

#[must_use]
pub const fn actor_stats(kind: ActorKind) -> ActorStats {
    match kind {
        ActorKind::Drone => ActorStats {
            max_health: 20.0,
            radius: 8.0,
            slow_effect: Some(0.6),
            seeker: Some(Seeker {
                speed: 70.0,
                range: 500.0,
            }),
        },
        ActorKind::Gunship => ActorStats {
            max_health: 60.0,
            radius: 14.0,
            slow_effect: None,
            seeker: None,
        },
        ActorKind::Sentry => ActorStats {
            max_health: 80.0,
            radius: 12.0,
            slow_effect: None,
            seeker: None,
        },
    }
}

const fn kind_name(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Drone => "Drone",
        ActorKind::Gunship => "Gunship",
        ActorKind::Sentry => "Sentry",
    }
}

// === Loadouts ===

/// Three-bullet even fan, whole salvo back at once.
#[must_use]
pub fn sentry_salvo() -> SalvoDefinition {
    SalvoDefinition {
        shots: vec![
            ShotDef {
                projectiles: vec![ProjectileKind::Bullet; 3],
                spread: SpreadPolicy::Even {
                    spread_degrees: 8.0,
                },
                sounds: vec![SoundKind::ShotLight, SoundKind::ShotHeavy],
                sound_volume: 0.8,
                delay: 0.25,
            };
            3
        ],
        reload: ReloadPolicy::AllAtOnce,
        additional_reload_time: 1.5,
    }
}

/// Two rockets with a loose random scatter, dripping back one at a time.
#[must_use]
pub fn gunship_salvo() -> SalvoDefinition {
    SalvoDefinition {
        shots: vec![
            ShotDef {
                projectiles: vec![ProjectileKind::Rocket],
                spread: SpreadPolicy::Random {
                    left: 5.0,
                    right: 5.0,
                },
                sounds: vec![SoundKind::RocketLaunch],
                sound_volume: 1.0,
                delay: 0.6,
            };
            2
        ],
        reload: ReloadPolicy::Incremental,
        additional_reload_time: 2.0,
    }
}

/// Rapid single bullets for the player's cursor turret.
#[must_use]
pub fn player_salvo() -> SalvoDefinition {
    SalvoDefinition {
        shots: vec![
            ShotDef {
                projectiles: vec![ProjectileKind::Bullet],
                spread: SpreadPolicy::Random {
                    left: 2.0,
                    right: 2.0,
                },
                sounds: vec![SoundKind::ShotLight],
                sound_volume: 0.6,
                delay: 0.12,
            };
            6
        ],
        reload: ReloadPolicy::Incremental,
        additional_reload_time: 0.3,
    }
}

fn turret_for(kind: ActorKind) -> Option<(Turret, Option<RotationLimits>, SalvoDefinition)> {
    match kind {
        ActorKind::Drone => None,
        ActorKind::Gunship => Some((
            Turret {
                rotation_speed: 90.0,
                basic_direction: 0.0,
                range: 400.0,
            },
            None,
            gunship_salvo(),
        )),
        ActorKind::Sentry => Some((
            Turret {
                rotation_speed: 60.0,
                basic_direction: 0.0,
                range: 350.0,
            },
            Some(RotationLimits {
                left: 60.0,
                right: 60.0,
            }),
            sentry_salvo(),
        )),
    }
}

// === Spawning ===

fn hull_tint(team: Team) -> Color {
    palette::team_tint(team).unwrap_or_else(|| {
        if !team.is_neutral() {
            warn!("no tint configured for {team:?}, using fallback");
        }
        palette::PROJECTILE
    })
}

/// Spawns a complete actor of the given kind: hull, physics body, health
/// bar, and (for armed kinds) a turret with its gun. `now` stamps the gun
/// as freshly loaded.
pub fn spawn_actor(
    commands: &mut Commands,
    kind: ActorKind,
    position: Vec2,
    team: Team,
    now: f32,
) -> Entity {
    let stats = actor_stats(kind);
    let mut vessel = commands.spawn((
        Name::new(kind_name(kind)),
        Actor,
        team,
        Facing::default(),
        Health::new(stats.max_health),
        HealthBarConfig {
            width: ACTOR_HEALTH_BAR_WIDTH,
            height: ACTOR_HEALTH_BAR_HEIGHT,
            y_offset: stats.radius + 6.0,
        },
        Pushable,
        Sprite::from_color(hull_tint(team), Vec2::splat(stats.radius * 2.0)),
        Transform::from_translation(position.extend(Z_ACTOR)),
        (
            RigidBody::Dynamic,
            Collider::circle(stats.radius),
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
    ));
    if let Some(factor) = stats.slow_effect {
        vessel.insert(SlowEffect(factor));
    }
    if let Some(seeker) = stats.seeker {
        vessel.insert(seeker);
    }
    let vessel = vessel.id();

    if let Some((turret, limits, salvo)) = turret_for(kind) {
        mount_turret(commands, vessel, team, turret, limits, false, salvo, now);
    }
    vessel
}

/// Mounts a turret (with one gun) on an existing vessel. Returns the
/// turret entity.
#[allow(clippy::too_many_arguments)]
pub fn mount_turret(
    commands: &mut Commands,
    vessel: Entity,
    team: Team,
    turret: Turret,
    limits: Option<RotationLimits>,
    cursor_steered: bool,
    salvo: SalvoDefinition,
    now: f32,
) -> Entity {
    let state = SalvoState::new(&salvo, now);
    let total = salvo.total_cost();

    let turret_id = commands
        .spawn((
            Name::new("Turret"),
            turret,
            team,
            Facing::default(),
            TurretState::default(),
            Sprite::from_color(palette::TURRET, Vec2::new(4.0, 12.0)),
            Transform::from_xyz(0.0, 0.0, 0.5),
            ChildOf(vessel),
        ))
        .id();
    if let Some(limits) = limits {
        commands.entity(turret_id).insert(limits);
    }
    if cursor_steered {
        commands.entity(turret_id).insert(CursorSteered);
    }

    commands.spawn((
        Name::new("Gun"),
        Gun::default(),
        team,
        salvo,
        state,
        FireCommand::default(),
        FiredBy(Some(vessel)),
        ReloadBarConfig {
            width: 16.0,
            height: 2.0,
            y_offset: -6.0,
            total_cost: total,
        },
        Transform::from_xyz(0.0, 8.0, 0.0),
        ChildOf(turret_id),
    ));

    turret_id
}

// === Systems ===

/// Steers every seeker hull at the nearest hostile inside its range.
/// Runs in `GameSet::Targeting` alongside turret aiming.
fn drive_seekers(
    registry: Res<CombatRegistry>,
    teams: Query<&Team>,
    positions: Query<&GlobalTransform>,
    mut seekers: Query<(&Seeker, &Team, &GlobalTransform, &mut LinearVelocity)>,
) {
    for (seeker, &team, global, mut velocity) in &mut seekers {
        let origin = global.translation().truncate();
        let hostiles = registry.hostiles(team, |e| teams.get(e).ok().copied());
        let prey = nearest_within(&hostiles, origin, seeker.range, |e| {
            positions.get(e).map(|t| t.translation().truncate()).ok()
        });
        velocity.0 = match prey.and_then(|e| positions.get(e).ok()) {
            Some(transform) => {
                (transform.translation().truncate() - origin).normalize_or_zero() * seeker.speed
            }
            None => Vec2::ZERO,
        };
    }
}

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.register_type::<ActorKind>().register_type::<Seeker>();

    app.add_systems(
        Update,
        drive_seekers
            .in_set(GameSet::Targeting)
            .run_if(gameplay_running),
    );
}
