//! Turret aiming: target acquisition, rotation with arc limits, idle sway,
//! and the fire gate feeding the guns underneath.
//!
//! A turret is a child of a vessel and owns a world-space [`Facing`]. Its
//! rest direction ("middle") is the vessel's facing plus a fixed offset;
//! rotation limits are expressed as an arc around that middle, `left`
//! opening toward −X and `right` toward +X.

use avian2d::prelude::SpatialQuery;
use bevy::ecs::entity::hash_map::EntityHashMap;
use bevy::prelude::*;
use rand::Rng;

use super::salvo::FireCommand;
use crate::gameplay::geometry;
use crate::gameplay::registry::CombatRegistry;
use crate::gameplay::{Facing, Team};
use crate::third_party::line_of_sight;
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Degrees of slack past a rotation limit when deciding whether a target is
/// reachable at all. Without it, targets sitting exactly on the limit
/// flicker in and out of the cone.
const LIMIT_TOLERANCE_DEGREES: f32 = 2.0;

/// Idle sway re-aims at a random interval in this range (seconds).
const SWAY_INTERVAL_SECS: (f32, f32) = (3.0, 8.0);

// === Components ===

/// Static aiming parameters of one turret.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Turret {
    /// Degrees per second.
    pub rotation_speed: f32,
    /// Rest direction relative to the parent vessel's facing.
    pub basic_direction: f32,
    /// Target acquisition radius.
    pub range: f32,
}

/// Arc limits around the turret's middle. Absent means free 360° rotation.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct RotationLimits {
    /// Degrees of travel toward −X.
    pub left: f32,
    /// Degrees of travel toward +X.
    pub right: f32,
}

/// This turret follows the aim cursor instead of acquiring targets.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CursorSteered;

/// Per-turret aiming state.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct TurretState {
    pub target: Option<Entity>,
    /// Offset from the middle the turret drifts to while idle.
    pub idle_target: f32,
    /// When to pick the next idle drift direction. Infinite while armed.
    pub next_sway_at: f32,
}

impl Default for TurretState {
    fn default() -> Self {
        Self {
            target: None,
            idle_target: 0.0,
            next_sway_at: 0.0,
        }
    }
}

// === Resources ===

/// Player aim input for the current tick, written by the input layer.
#[derive(Resource, Debug, Default)]
pub struct AimCursor {
    /// World position under the cursor, when the cursor is over the arena.
    pub position: Option<Vec2>,
    pub fire_held: bool,
}

// === Pure aiming math ===

/// Clamps an offset-from-middle into the turret's arc.
#[must_use]
pub fn clamp_to_limits(offset: f32, limits: Option<&RotationLimits>) -> f32 {
    match limits {
        Some(limits) => offset.clamp(-limits.right, limits.left),
        None => offset,
    }
}

/// Whether an offset-from-middle is reachable, with tolerance slack.
#[must_use]
pub fn in_cone(offset: f32, limits: Option<&RotationLimits>) -> bool {
    match limits {
        Some(limits) => {
            offset >= -limits.right - LIMIT_TOLERANCE_DEGREES
                && offset <= limits.left + LIMIT_TOLERANCE_DEGREES
        }
        None => true,
    }
}

/// Everything a turret may engage: hostile actors plus obstacles. Obstacles
/// carry no team and count as targetable for every side.
#[must_use]
pub fn target_candidates(
    registry: &CombatRegistry,
    team: Team,
    team_of: impl Fn(Entity) -> Option<Team>,
) -> Vec<Entity> {
    let mut candidates = registry.hostiles(team, team_of);
    candidates.extend(registry.obstacles());
    candidates
}

/// Picks a target among `candidates`: must be in range, inside the cone,
/// and visible; among those, the one needing the least rotation from the
/// current facing wins. Least-rotation keeps an engaged turret on its
/// current victim instead of hopping to whichever enemy is closest.
#[must_use]
pub fn select_target(
    candidates: &[Entity],
    origin: Vec2,
    facing: f32,
    middle: f32,
    range: f32,
    limits: Option<&RotationLimits>,
    position_of: impl Fn(Entity) -> Option<Vec2>,
    can_see: impl Fn(Entity, Vec2) -> bool,
) -> Option<Entity> {
    candidates
        .iter()
        .copied()
        .filter_map(|entity| {
            let position = position_of(entity)?;
            if position.distance(origin) > range {
                return None;
            }
            let bearing = geometry::angle_from_up(position - origin);
            if !in_cone(geometry::delta_angle(middle, bearing), limits) {
                return None;
            }
            if !can_see(entity, position) {
                return None;
            }
            Some((entity, geometry::delta_angle(facing, bearing).abs()))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(entity, _)| entity)
}

// === Systems ===

/// Scans the registry for the best hostile or obstacle per turret.
/// Runs in `GameSet::Targeting` before rotation.
fn acquire_targets(
    spatial: SpatialQuery,
    registry: Res<CombatRegistry>,
    teams: Query<&Team>,
    positions: Query<&GlobalTransform>,
    parent_facings: Query<&Facing>,
    parents: Query<&ChildOf>,
    mut turrets: Query<
        (
            Entity,
            &Turret,
            &Team,
            &Facing,
            Option<&RotationLimits>,
            &GlobalTransform,
            &mut TurretState,
        ),
        Without<CursorSteered>,
    >,
) {
    for (entity, turret, &team, facing, limits, global, mut state) in &mut turrets {
        let origin = global.translation().truncate();
        let vessel = parents.get(entity).map(ChildOf::parent).ok();
        let middle = vessel
            .and_then(|v| parent_facings.get(v).ok())
            .map_or(0.0, |f| f.0)
            + turret.basic_direction;
        let ignore = vessel.unwrap_or(entity);

        let candidates = target_candidates(&registry, team, |e| teams.get(e).ok().copied());
        state.target = select_target(
            &candidates,
            origin,
            facing.0,
            middle,
            turret.range,
            limits,
            |e| positions.get(e).map(|t| t.translation().truncate()).ok(),
            |e, pos| line_of_sight(&spatial, origin, ignore, e, pos),
        );
    }
}

/// Turns every turret toward its aim point at its rotation speed. Armed
/// turrets track their target (or the cursor); idle turrets sway inside
/// their arc on a random interval.
fn rotate_turrets(
    time: Res<Time>,
    cursor: Res<AimCursor>,
    parents: Query<(Entity, &ChildOf), With<Turret>>,
    mut facings: ParamSet<(
        Query<&Facing>,
        Query<(
            Entity,
            &Turret,
            &mut Facing,
            &mut TurretState,
            Option<&RotationLimits>,
            Option<&CursorSteered>,
            &GlobalTransform,
        )>,
    )>,
    positions: Query<&GlobalTransform>,
) {
    let now = time.elapsed_secs();
    let dt = time.delta_secs();
    let mut rng = rand::rng();

    let vessel_facing: EntityHashMap<f32> = {
        let facing_query = facings.p0();
        parents
            .iter()
            .map(|(turret, child_of)| {
                let facing = facing_query
                    .get(child_of.parent())
                    .map_or(0.0, |facing| facing.0);
                (turret, facing)
            })
            .collect()
    };

    for (entity, turret, mut facing, mut state, limits, steered, global) in &mut facings.p1() {
        let middle = geometry::normalize_angle(
            vessel_facing.get(&entity).copied().unwrap_or(0.0) + turret.basic_direction,
        );
        let origin = global.translation().truncate();

        let aim_point = if steered.is_some() {
            cursor.position
        } else {
            state
                .target
                .and_then(|t| positions.get(t).ok())
                .map(|t| t.translation().truncate())
        };

        let desired = match aim_point {
            Some(point) => {
                state.next_sway_at = f32::INFINITY;
                let bearing = geometry::angle_from_up(point - origin);
                let offset = clamp_to_limits(geometry::delta_angle(middle, bearing), limits);
                middle + offset
            }
            None => {
                if state.next_sway_at.is_infinite() {
                    // Just disarmed: hold position, sway again later.
                    state.idle_target = geometry::delta_angle(middle, facing.0);
                    state.next_sway_at = now + rng.random_range(SWAY_INTERVAL_SECS.0..=SWAY_INTERVAL_SECS.1);
                } else if now >= state.next_sway_at {
                    state.idle_target = match limits {
                        Some(limits) => {
                            geometry::random_angle_in_range(&mut rng, limits.left, limits.right)
                        }
                        None => rng.random_range(-180.0..180.0),
                    };
                    state.next_sway_at = now + rng.random_range(SWAY_INTERVAL_SECS.0..=SWAY_INTERVAL_SECS.1);
                }
                middle + state.idle_target
            }
        };

        let step = geometry::delta_angle(facing.0, desired)
            .clamp(-turret.rotation_speed * dt, turret.rotation_speed * dt);
        facing.0 = geometry::normalize_angle(facing.0 + step);
    }
}

/// Opens or closes every child gun's fire gate. A turret fires whenever it
/// holds an acquired target; cursor turrets fire while the button is held
/// over the arena. Pointing at the target is the rotation system's job and
/// never gates the guns.
fn update_fire_gates(
    cursor: Res<AimCursor>,
    turrets: Query<(&TurretState, Option<&CursorSteered>, &Children)>,
    mut gates: Query<&mut FireCommand>,
) {
    for (state, steered, children) in &turrets {
        let armed = if steered.is_some() {
            cursor.fire_held && cursor.position.is_some()
        } else {
            state.target.is_some()
        };

        for child in children.iter() {
            if let Ok(mut gate) = gates.get_mut(child) {
                gate.0 = armed;
            }
        }
    }
}

/// Mirrors the logical facing into the sprite rotation. Vessel transforms
/// stay axis-aligned, so the turret's local rotation is its world facing.
fn sync_turret_sprites(mut turrets: Query<(&Facing, &mut Transform), With<Turret>>) {
    for (facing, mut transform) in &mut turrets {
        transform.rotation = Quat::from_rotation_z(facing.0.to_radians());
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Turret>()
        .register_type::<RotationLimits>()
        .register_type::<CursorSteered>()
        .register_type::<TurretState>();

    app.init_resource::<AimCursor>();

    app.add_systems(
        Update,
        (acquire_targets, rotate_turrets, update_fire_gates)
            .chain()
            .in_set(GameSet::Targeting)
            .run_if(gameplay_running),
    );
    app.add_systems(
        Update,
        sync_turret_sprites
            .in_set(GameSet::Ui)
            .run_if(gameplay_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testing::{advance_and_update, create_test_app};
    use std::time::Duration;

    fn create_turret_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<AimCursor>();
        app.add_systems(Update, (rotate_turrets, update_fire_gates).chain());
        app.update(); // Initialize time
        app
    }

    fn spawn_turret(world: &mut World, limits: Option<RotationLimits>) -> Entity {
        let turret = world
            .spawn((
                Turret {
                    rotation_speed: 45.0,
                    basic_direction: 0.0,
                    range: 500.0,
                },
                Facing(0.0),
                TurretState {
                    next_sway_at: f32::INFINITY, // keep tests free of random sway
                    ..Default::default()
                },
                Transform::default(),
                GlobalTransform::default(),
            ))
            .id();
        if let Some(limits) = limits {
            world.entity_mut(turret).insert(limits);
        }
        turret
    }

    fn spawn_target(world: &mut World, position: Vec2) -> Entity {
        world
            .spawn((
                Transform::from_translation(position.extend(0.0)),
                GlobalTransform::from_translation(position.extend(0.0)),
            ))
            .id()
    }

    #[test]
    fn rotation_is_limited_by_speed() {
        let mut app = create_turret_test_app();
        let target = spawn_target(app.world_mut(), Vec2::new(-100.0, 0.0)); // bearing 90
        let turret = spawn_turret(app.world_mut(), None);
        app.world_mut().get_mut::<TurretState>(turret).unwrap().target = Some(target);

        advance_and_update(&mut app, Duration::from_millis(500));

        // 45 deg/s for half a second.
        let facing = app.world().get::<Facing>(turret).unwrap();
        assert!((facing.0 - 22.5).abs() < 0.5, "got {}", facing.0);
    }

    #[test]
    fn turret_settles_on_its_target() {
        let mut app = create_turret_test_app();
        let target = spawn_target(app.world_mut(), Vec2::new(-100.0, 0.0));
        let turret = spawn_turret(app.world_mut(), None);
        app.world_mut().get_mut::<TurretState>(turret).unwrap().target = Some(target);

        for _ in 0..10 {
            advance_and_update(&mut app, Duration::from_millis(500));
        }

        let facing = app.world().get::<Facing>(turret).unwrap();
        assert!((facing.0 - 90.0).abs() < 0.5, "got {}", facing.0);
    }

    #[test]
    fn limited_turret_stops_at_its_arc() {
        let mut app = create_turret_test_app();
        let target = spawn_target(app.world_mut(), Vec2::new(-100.0, 0.0)); // wants 90
        let turret = spawn_turret(
            app.world_mut(),
            Some(RotationLimits {
                left: 30.0,
                right: 30.0,
            }),
        );
        app.world_mut().get_mut::<TurretState>(turret).unwrap().target = Some(target);

        for _ in 0..10 {
            advance_and_update(&mut app, Duration::from_millis(500));
        }

        let facing = app.world().get::<Facing>(turret).unwrap();
        assert!((facing.0 - 30.0).abs() < 0.5, "got {}", facing.0);
    }

    #[test]
    fn armed_turret_opens_child_fire_gates() {
        let mut app = create_turret_test_app();
        let target = spawn_target(app.world_mut(), Vec2::new(0.0, 100.0)); // dead ahead
        let turret = spawn_turret(app.world_mut(), None);
        app.world_mut().get_mut::<TurretState>(turret).unwrap().target = Some(target);
        let gun = app.world_mut().spawn(FireCommand(false)).id();
        app.world_mut().entity_mut(turret).add_child(gun);

        advance_and_update(&mut app, Duration::from_millis(16));

        assert!(app.world().get::<FireCommand>(gun).unwrap().0);
    }

    #[test]
    fn gates_open_while_the_turret_is_still_turning() {
        // Fire readiness tracks having a target, not pointing at it yet.
        let mut app = create_turret_test_app();
        let target = spawn_target(app.world_mut(), Vec2::new(-100.0, 0.0)); // 90 away
        let turret = spawn_turret(app.world_mut(), None);
        app.world_mut().get_mut::<TurretState>(turret).unwrap().target = Some(target);
        let gun = app.world_mut().spawn(FireCommand(false)).id();
        app.world_mut().entity_mut(turret).add_child(gun);

        advance_and_update(&mut app, Duration::from_millis(16));

        let facing = app.world().get::<Facing>(turret).unwrap();
        assert!(facing.0 < 45.0, "still far from the target at {}", facing.0);
        assert!(app.world().get::<FireCommand>(gun).unwrap().0);
    }

    #[test]
    fn unarmed_turret_keeps_gates_closed() {
        let mut app = create_turret_test_app();
        let turret = spawn_turret(app.world_mut(), None);
        let gun = app.world_mut().spawn(FireCommand(true)).id();
        app.world_mut().entity_mut(turret).add_child(gun);

        advance_and_update(&mut app, Duration::from_millis(16));

        assert!(!app.world().get::<FireCommand>(gun).unwrap().0);
    }

    #[test]
    fn cursor_turret_requires_fire_button() {
        let mut app = create_turret_test_app();
        let turret = spawn_turret(app.world_mut(), None);
        app.world_mut().entity_mut(turret).insert(CursorSteered);
        let gun = app.world_mut().spawn(FireCommand(false)).id();
        app.world_mut().entity_mut(turret).add_child(gun);

        // Cursor dead ahead, button not held.
        app.world_mut().resource_mut::<AimCursor>().position = Some(Vec2::new(0.0, 100.0));
        advance_and_update(&mut app, Duration::from_millis(16));
        assert!(!app.world().get::<FireCommand>(gun).unwrap().0);

        app.world_mut().resource_mut::<AimCursor>().fire_held = true;
        advance_and_update(&mut app, Duration::from_millis(16));
        assert!(app.world().get::<FireCommand>(gun).unwrap().0);
    }

    #[test]
    fn idle_turret_sways_inside_its_arc() {
        let mut app = create_turret_test_app();
        let turret = spawn_turret(
            app.world_mut(),
            Some(RotationLimits {
                left: 40.0,
                right: 20.0,
            }),
        );
        app.world_mut().get_mut::<TurretState>(turret).unwrap().next_sway_at = 0.0;

        for _ in 0..100 {
            advance_and_update(&mut app, Duration::from_millis(200));
            let state = app.world().get::<TurretState>(turret).unwrap();
            assert!(
                (-20.0..=40.0).contains(&state.idle_target),
                "sway target {} left the arc",
                state.idle_target
            );
        }
    }
}
