//! Projectile lifecycle: movement, fuse expiry, contact resolution, and the
//! break cascade.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::break_rules::{BreakRules, Contact, should_break};
use super::factory::{ProjectileKind, projectile_spec, summon_projectile};
use super::{DamageTags, DespawnAtTickEnd, Destroyed, FiredBy, SpawnedAt};
use crate::gameplay::feedback::{PlaySoundRequest, random_variant};
use crate::gameplay::geometry;
use crate::gameplay::registry::{Actor, CombatRegistry, Obstacle};
use crate::gameplay::{Health, Pushable, Team};
use crate::{GameSet, gameplay_running};

// === Components ===

/// A piece of ordnance in flight. Velocity is fixed at spawn; projectiles
/// fly straight.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub damage: f32,
    pub velocity: Vec2,
}

/// Seconds this projectile lives after spawn.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Lifetime {
    pub secs: f32,
}

/// Kinds spawned at this projectile's position when it breaks.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SpawnsOnBreak(pub Vec<ProjectileKind>);

/// Knockback applied to [`Pushable`] contacts, as a velocity impulse.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Pushing {
    pub power: f32,
}

/// Contacts this projectile has already damaged. avian keeps an overlap in
/// `CollidingEntities` for as long as it lasts; damage and knockback apply
/// once per contact onset, not once per tick.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct DamagedContacts(pub Vec<Entity>);

// === Registry hooks ===

fn on_add_projectile(
    add: On<Add, Projectile>,
    teams: Query<&Team>,
    mut registry: ResMut<CombatRegistry>,
) {
    let team = teams.get(add.entity).copied().unwrap_or(Team::NEUTRAL);
    registry.add_projectile(add.entity, team);
}

fn on_remove_projectile(remove: On<Remove, Projectile>, mut registry: ResMut<CombatRegistry>) {
    registry.remove_projectile(remove.entity);
}

// === Systems ===

/// Straight-line flight. Kinematic bodies are stepped by hand so flight
/// speed is exact and independent of the physics solver.
fn move_projectiles(
    time: Res<Time>,
    mut projectiles: Query<(&Projectile, &mut Transform), Without<Destroyed>>,
) {
    let dt = time.delta_secs();
    for (projectile, mut transform) in &mut projectiles {
        transform.translation += (projectile.velocity * dt).extend(0.0);
    }
}

/// Bombs swell over their fuse as a telegraph.
fn grow_bombs(
    time: Res<Time>,
    mut bombs: Query<(&Projectile, &SpawnedAt, &Lifetime, &mut Transform), Without<Destroyed>>,
) {
    let now = time.elapsed_secs();
    for (projectile, spawned_at, lifetime, mut transform) in &mut bombs {
        if projectile.kind != ProjectileKind::Bomb {
            continue;
        }
        let ratio = ((now - spawned_at.0) / lifetime.secs).clamp(0.0, 1.0);
        transform.scale = Vec3::splat(ratio.mul_add(0.5, 1.0));
    }
}

/// Ends projectiles whose lifetime ran out. Ordinary shots vanish silently;
/// fused kinds run the break cascade (a bomb leaves its explosion behind).
fn expire_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut sounds: MessageWriter<PlaySoundRequest>,
    projectiles: Query<
        (
            Entity,
            &Projectile,
            &Team,
            &FiredBy,
            &SpawnedAt,
            &Lifetime,
            &SpawnsOnBreak,
            &Transform,
        ),
        Without<Destroyed>,
    >,
) {
    let now = time.elapsed_secs();
    for (entity, projectile, &team, &fired_by, spawned_at, lifetime, spawns, transform) in
        &projectiles
    {
        if now - spawned_at.0 < lifetime.secs {
            continue;
        }
        if projectile_spec(projectile.kind).detonates_on_expiry {
            shatter(
                &mut commands,
                &mut sounds,
                entity,
                projectile,
                team,
                fired_by,
                spawns,
                transform.translation.truncate(),
                now,
            );
        } else {
            commands.entity(entity).insert((Destroyed, DespawnAtTickEnd));
        }
    }
}

/// Resolves this frame's contacts for every live projectile: apply damage
/// and knockback once per contact, then consult the break rules. The first
/// breaking contact ends the projectile; remaining contacts are ignored.
/// The break/grace check re-runs every tick a contact persists, so a shot
/// that outlives its owner grace still breaks on a lingering overlap.
fn handle_projectile_contacts(
    mut commands: Commands,
    time: Res<Time>,
    mut sounds: MessageWriter<PlaySoundRequest>,
    mut projectiles: Query<
        (
            Entity,
            &Projectile,
            &Team,
            &FiredBy,
            &SpawnedAt,
            &BreakRules,
            &SpawnsOnBreak,
            &CollidingEntities,
            &Transform,
            Option<&Pushing>,
            &mut DamagedContacts,
        ),
        Without<Destroyed>,
    >,
    mut healths: Query<&mut Health, Without<Destroyed>>,
    mut velocities: Query<&mut LinearVelocity, With<Pushable>>,
    obstacles: Query<(), With<Obstacle>>,
    actors: Query<(), With<Actor>>,
    destroyed: Query<(), With<Destroyed>>,
    teams: Query<&Team>,
    tags: Query<&DamageTags, With<Projectile>>,
    positions: Query<&Transform>,
) {
    let now = time.elapsed_secs();
    for (
        entity,
        projectile,
        &team,
        &fired_by,
        spawned_at,
        rules,
        spawns,
        colliding,
        transform,
        pushing,
        mut damaged,
    ) in &mut projectiles
    {
        let position = transform.translation.truncate();
        let age = now - spawned_at.0;
        for &other in &colliding.0 {
            // Entities already destroyed this frame absorb nothing further.
            if destroyed.contains(other) {
                continue;
            }

            let other_team = teams.get(other).ok().copied();
            let hostile = other_team.is_none_or(|t| !t.allied_with(team));

            if hostile && !damaged.0.contains(&other) {
                damaged.0.push(other);
                if let Ok(mut health) = healths.get_mut(other) {
                    health.current -= projectile.damage;
                }
                if let (Some(pushing), Ok(mut velocity)) = (pushing, velocities.get_mut(other)) {
                    let away = positions
                        .get(other)
                        .map(|t| t.translation.truncate() - position)
                        .unwrap_or(projectile.velocity)
                        .normalize_or(Vec2::Y);
                    velocity.0 += away * pushing.power;
                }
            }

            let contact = Contact {
                is_obstacle: obstacles.contains(other),
                is_actor: actors.contains(other),
                team: other_team,
                tags: tags.get(other).ok(),
                is_owner: fired_by.0 == Some(other),
            };
            if should_break(rules, team, age, &contact) {
                shatter(
                    &mut commands,
                    &mut sounds,
                    entity,
                    projectile,
                    team,
                    fired_by,
                    spawns,
                    position,
                    now,
                );
                break;
            }
        }
    }
}

/// Destroys a projectile: latch [`Destroyed`], queue the tick-end despawn,
/// play one break sound variant, and spawn the break cascade.
#[allow(clippy::too_many_arguments)]
fn shatter(
    commands: &mut Commands,
    sounds: &mut MessageWriter<PlaySoundRequest>,
    entity: Entity,
    projectile: &Projectile,
    team: Team,
    fired_by: FiredBy,
    spawns: &SpawnsOnBreak,
    position: Vec2,
    now: f32,
) {
    commands.entity(entity).insert((Destroyed, DespawnAtTickEnd));

    let spec = projectile_spec(projectile.kind);
    let mut rng = rand::rng();
    if let Some(kind) = random_variant(&mut rng, spec.break_sounds) {
        sounds.write(PlaySoundRequest::new(kind, position));
    }

    let rotation = geometry::angle_from_up(projectile.velocity);
    for &kind in &spawns.0 {
        summon_projectile(commands, kind, position, rotation, team, fired_by.0, now);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Projectile>()
        .register_type::<Lifetime>()
        .register_type::<SpawnsOnBreak>()
        .register_type::<Pushing>()
        .register_type::<DamagedContacts>();

    app.add_observer(on_add_projectile)
        .add_observer(on_remove_projectile);

    // Move before resolving contacts so a shot spawned this frame cannot
    // hit before it has ever flown. A full chain (with command application
    // between systems) so an expiry-shattered projectile is already
    // `Destroyed` when contact resolution runs.
    app.add_systems(
        Update,
        (
            move_projectiles,
            grow_bombs,
            expire_projectiles,
            handle_projectile_contacts,
        )
            .chain()
            .in_set(GameSet::Combat)
            .run_if(gameplay_running),
    );
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use super::super::break_rules::BreaksOn;
    use crate::testing::{advance_and_update, create_test_app};
    use bevy::ecs::entity::hash_set::EntityHashSet;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn create_projectile_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<CombatRegistry>();
        app.add_message::<PlaySoundRequest>();
        app.add_systems(
            Update,
            (move_projectiles, expire_projectiles, handle_projectile_contacts).chain(),
        );
        app.update(); // Initialize time (first frame delta=0)
        app
    }

    /// Spawn a bullet-like projectile with explicit rules and pre-populated
    /// contacts.
    fn spawn_projectile(
        world: &mut World,
        team: Team,
        rules: &[BreaksOn],
        owner: Option<Entity>,
        colliding_with: &[Entity],
    ) -> Entity {
        let now = world.resource::<Time>().elapsed_secs();
        world
            .spawn((
                Projectile {
                    kind: ProjectileKind::Bullet,
                    damage: 6.0,
                    velocity: Vec2::new(0.0, 420.0),
                },
                team,
                FiredBy(owner),
                SpawnedAt(now),
                BreakRules(rules.to_vec()),
                SpawnsOnBreak::default(),
                DamagedContacts::default(),
                Lifetime { secs: 100.0 },
                Transform::default(),
                CollidingEntities(EntityHashSet::from_iter(colliding_with.iter().copied())),
            ))
            .id()
    }

    fn spawn_actor_target(world: &mut World, team: Team, hp: f32) -> Entity {
        world
            .spawn((Actor, team, Health::new(hp), Transform::default()))
            .id()
    }

    #[test]
    fn enemy_contact_damages_and_breaks() {
        let mut app = create_projectile_test_app();

        let target = spawn_actor_target(app.world_mut(), Team(2), 20.0);
        let bullet = spawn_projectile(
            app.world_mut(),
            Team(1),
            &[BreaksOn::Enemies],
            None,
            &[target],
        );
        advance_and_update(&mut app, Duration::from_millis(16));

        let health = app.world().get::<Health>(target).unwrap();
        assert_eq!(health.current, 14.0);
        assert!(app.world().get::<Destroyed>(bullet).is_some());
        assert!(app.world().get::<DespawnAtTickEnd>(bullet).is_some());
    }

    #[test]
    fn ally_contact_deals_no_damage() {
        let mut app = create_projectile_test_app();

        let ally = spawn_actor_target(app.world_mut(), Team(1), 20.0);
        spawn_projectile(app.world_mut(), Team(1), &[BreaksOn::Enemies], None, &[ally]);
        advance_and_update(&mut app, Duration::from_millis(16));

        let health = app.world().get::<Health>(ally).unwrap();
        assert_eq!(health.current, 20.0);
    }

    #[test]
    fn owner_grace_spares_the_shooter_briefly() {
        let mut app = create_projectile_test_app();

        let shooter = spawn_actor_target(app.world_mut(), Team(1), 20.0);
        let bullet = spawn_projectile(
            app.world_mut(),
            Team(1),
            &[BreaksOn::Allies],
            Some(shooter),
            &[shooter],
        );

        // Inside the 0.1 s window the shot survives its own hull.
        advance_and_update(&mut app, Duration::from_millis(16));
        assert!(app.world().get::<Destroyed>(bullet).is_none());

        // Past the window the ally rule applies even to the owner.
        advance_and_update(&mut app, Duration::from_millis(200));
        assert!(app.world().get::<Destroyed>(bullet).is_some());
    }

    #[test]
    fn obstacle_breaks_without_damage() {
        let mut app = create_projectile_test_app();

        let wall = app
            .world_mut()
            .spawn((Obstacle, Health::new(50.0), Transform::default()))
            .id();
        let bullet = spawn_projectile(
            app.world_mut(),
            Team(1),
            &[BreaksOn::Obstacles],
            None,
            &[wall],
        );
        advance_and_update(&mut app, Duration::from_millis(16));

        assert!(app.world().get::<Destroyed>(bullet).is_some());
        // Teamless obstacles still count as hostile for damage purposes.
        let health = app.world().get::<Health>(wall).unwrap();
        assert_eq!(health.current, 44.0);
    }

    #[test]
    fn destroyed_target_absorbs_nothing_further() {
        let mut app = create_projectile_test_app();

        let target = spawn_actor_target(app.world_mut(), Team(2), 20.0);
        app.world_mut().entity_mut(target).insert(Destroyed);
        let bullet = spawn_projectile(
            app.world_mut(),
            Team(1),
            &[BreaksOn::Enemies],
            None,
            &[target],
        );
        advance_and_update(&mut app, Duration::from_millis(16));

        let health = app.world().get::<Health>(target).unwrap();
        assert_eq!(health.current, 20.0);
        assert!(app.world().get::<Destroyed>(bullet).is_none());
    }

    #[test]
    fn empty_rules_pass_through_while_still_damaging() {
        let mut app = create_projectile_test_app();

        let target = spawn_actor_target(app.world_mut(), Team(2), 20.0);
        let bullet = spawn_projectile(app.world_mut(), Team(1), &[], None, &[target]);
        advance_and_update(&mut app, Duration::from_millis(16));

        let health = app.world().get::<Health>(target).unwrap();
        assert_eq!(health.current, 14.0);
        assert!(app.world().get::<Destroyed>(bullet).is_none());
    }

    #[test]
    fn sustained_contact_damages_only_once() {
        let mut app = create_projectile_test_app();

        // A non-breaking projectile sits inside the target for several
        // ticks; the contact stays in the overlap set the whole time.
        let target = spawn_actor_target(app.world_mut(), Team(2), 100.0);
        spawn_projectile(app.world_mut(), Team(1), &[], None, &[target]);

        advance_and_update(&mut app, Duration::from_millis(16));
        advance_and_update(&mut app, Duration::from_millis(16));
        advance_and_update(&mut app, Duration::from_millis(16));

        let health = app.world().get::<Health>(target).unwrap();
        assert_eq!(health.current, 94.0);
    }

    #[test]
    fn sustained_contact_pushes_only_once() {
        let mut app = create_projectile_test_app();

        let target = app
            .world_mut()
            .spawn((
                Actor,
                Team(2),
                Pushable,
                LinearVelocity::ZERO,
                Transform::from_xyz(0.0, 10.0, 0.0),
            ))
            .id();
        let bullet = spawn_projectile(app.world_mut(), Team(1), &[], None, &[target]);
        app.world_mut()
            .entity_mut(bullet)
            .insert(Pushing { power: 50.0 });

        advance_and_update(&mut app, Duration::from_millis(16));
        let first = app.world().get::<LinearVelocity>(target).unwrap().0;
        advance_and_update(&mut app, Duration::from_millis(16));
        let second = app.world().get::<LinearVelocity>(target).unwrap().0;

        assert!(first.length() > 0.0);
        assert_eq!(first, second);
    }

    #[test]
    fn knockback_requires_pushable() {
        let mut app = create_projectile_test_app();

        let pushable = app
            .world_mut()
            .spawn((
                Actor,
                Team(2),
                Pushable,
                LinearVelocity::ZERO,
                Transform::from_xyz(0.0, 10.0, 0.0),
            ))
            .id();
        let anchored = app
            .world_mut()
            .spawn((
                Actor,
                Team(2),
                LinearVelocity::ZERO,
                Transform::from_xyz(0.0, -10.0, 0.0),
            ))
            .id();

        let bullet = spawn_projectile(app.world_mut(), Team(1), &[], None, &[pushable, anchored]);
        app.world_mut()
            .entity_mut(bullet)
            .insert(Pushing { power: 50.0 });
        advance_and_update(&mut app, Duration::from_millis(16));

        let pushed = app.world().get::<LinearVelocity>(pushable).unwrap();
        assert!(pushed.0.length() > 0.0);
        let held = app.world().get::<LinearVelocity>(anchored).unwrap();
        assert_eq!(held.0, Vec2::ZERO);
    }

    #[test]
    fn projectiles_fly_straight() {
        let mut app = create_projectile_test_app();

        let bullet = spawn_projectile(app.world_mut(), Team(1), &[], None, &[]);
        advance_and_update(&mut app, Duration::from_millis(100));

        let transform = app.world().get::<Transform>(bullet).unwrap();
        assert!(transform.translation.y > 0.0);
        assert_eq!(transform.translation.x, 0.0);
    }

    #[test]
    fn expired_bullet_is_destroyed_silently() {
        let mut app = create_projectile_test_app();

        let bullet = spawn_projectile(app.world_mut(), Team(1), &[], None, &[]);
        app.world_mut()
            .entity_mut(bullet)
            .insert(Lifetime { secs: 0.05 });
        advance_and_update(&mut app, Duration::from_millis(100));

        assert!(app.world().get::<Destroyed>(bullet).is_some());
        // Nothing spawned in its place.
        let mut projectiles = app.world_mut().query::<&Projectile>();
        assert_eq!(projectiles.iter(app.world()).count(), 1);
    }

    #[test]
    fn expired_bomb_detonates_into_explosion() {
        let mut app = create_projectile_test_app();

        let now = app.world().resource::<Time>().elapsed_secs();
        let bomb = app
            .world_mut()
            .spawn((
                Projectile {
                    kind: ProjectileKind::Bomb,
                    damage: 0.0,
                    velocity: Vec2::ZERO,
                },
                Team(2),
                FiredBy(None),
                SpawnedAt(now),
                BreakRules::default(),
                SpawnsOnBreak(vec![ProjectileKind::Explosion]),
                DamagedContacts::default(),
                Lifetime { secs: 0.05 },
                Transform::from_xyz(30.0, 40.0, 0.0),
                CollidingEntities::default(),
            ))
            .id();
        advance_and_update(&mut app, Duration::from_millis(100));

        assert!(app.world().get::<Destroyed>(bomb).is_some());
        let mut projectiles = app.world_mut().query::<(Entity, &Projectile, &Transform)>();
        let explosion = projectiles
            .iter(app.world())
            .find(|(e, p, _)| *e != bomb && p.kind == ProjectileKind::Explosion);
        let (_, _, transform) = explosion.expect("bomb should leave an explosion");
        assert_eq!(transform.translation.truncate(), Vec2::new(30.0, 40.0));
    }
}
