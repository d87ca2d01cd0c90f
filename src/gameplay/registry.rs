//! Spatial/team registry: typed buckets of live entities, queryable by team
//! and proximity.
//!
//! The registry holds non-owning [`Entity`] ids — it indexes, it never
//! destroys. Buckets are maintained by component lifecycle observers, so
//! registration is synchronous with spawn/despawn command application. Every
//! query returns a snapshot copy; callers may mutate results freely.

use avian2d::prelude::CollidingEntities;
use bevy::prelude::*;

use super::{Player, Team};
use crate::{GameSet, gameplay_running};

// === Markers ===

/// Terrain/wreckage the registry indexes in the obstacle bucket. Obstacles
/// are breakable-against but deal no damage themselves.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Obstacle;

/// A combat participant with a health pool. Actors populate the bucket that
/// targeting scans for hostiles.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Actor;

// === Resource ===

/// Process-wide indices of live entities. Owned by the Bevy [`World`], never
/// a global — tests build their own and tear it down with the world.
#[derive(Resource, Debug, Default)]
pub struct CombatRegistry {
    obstacles: Vec<Entity>,
    projectiles: Vec<Entity>,
    player_projectiles: Vec<Entity>,
    actors: Vec<Entity>,
    touching_player: Vec<Entity>,
}

impl CombatRegistry {
    // --- Registration (idempotent; duplicate adds and missing removes are no-ops) ---

    pub fn add_obstacle(&mut self, entity: Entity) {
        push_unique(&mut self.obstacles, entity);
    }

    pub fn remove_obstacle(&mut self, entity: Entity) {
        self.obstacles.retain(|&e| e != entity);
    }

    pub fn add_actor(&mut self, entity: Entity) {
        push_unique(&mut self.actors, entity);
    }

    pub fn remove_actor(&mut self, entity: Entity) {
        self.actors.retain(|&e| e != entity);
    }

    pub fn add_projectile(&mut self, entity: Entity, team: Team) {
        push_unique(&mut self.projectiles, entity);
        if team == Team::PLAYER {
            push_unique(&mut self.player_projectiles, entity);
        }
    }

    pub fn remove_projectile(&mut self, entity: Entity) {
        self.projectiles.retain(|&e| e != entity);
        self.player_projectiles.retain(|&e| e != entity);
    }

    pub fn set_touching_player(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.touching_player.clear();
        self.touching_player.extend(entities);
    }

    // --- Snapshots ---

    #[must_use]
    pub fn obstacles(&self) -> Vec<Entity> {
        self.obstacles.clone()
    }

    #[must_use]
    pub fn actors(&self) -> Vec<Entity> {
        self.actors.clone()
    }

    #[must_use]
    pub fn projectiles(&self) -> Vec<Entity> {
        self.projectiles.clone()
    }

    #[must_use]
    pub fn player_projectiles(&self) -> Vec<Entity> {
        self.player_projectiles.clone()
    }

    #[must_use]
    pub fn touching_player(&self) -> Vec<Entity> {
        self.touching_player.clone()
    }

    // --- Team-filtered views ---

    /// Actors on a different team than `team`. Entities whose team cannot be
    /// resolved are skipped.
    #[must_use]
    pub fn hostiles(&self, team: Team, team_of: impl Fn(Entity) -> Option<Team>) -> Vec<Entity> {
        self.actors
            .iter()
            .copied()
            .filter(|&e| team_of(e).is_some_and(|t| !t.allied_with(team)))
            .collect()
    }

    /// Actors on the same team as `team`, optionally excluding one entity
    /// (typically the asker itself).
    #[must_use]
    pub fn allies(
        &self,
        team: Team,
        exclude: Option<Entity>,
        team_of: impl Fn(Entity) -> Option<Team>,
    ) -> Vec<Entity> {
        self.actors
            .iter()
            .copied()
            .filter(|&e| Some(e) != exclude && team_of(e).is_some_and(|t| t.allied_with(team)))
            .collect()
    }

    /// Strongest slow multiplier among entities touching the player.
    /// `1.0` when nothing touching the player slows.
    #[must_use]
    pub fn highest_slow_factor(&self, slow_of: impl Fn(Entity) -> Option<f32>) -> f32 {
        self.touching_player
            .iter()
            .filter_map(|&e| slow_of(e))
            .fold(1.0, f32::min)
    }
}

fn push_unique(bucket: &mut Vec<Entity>, entity: Entity) {
    if !bucket.contains(&entity) {
        bucket.push(entity);
    }
}

// === Proximity queries ===
//
// Free functions over candidate snapshots so team filtering composes with
// proximity. Candidates whose position cannot be resolved are skipped.

/// The candidate nearest to `point`, or `None` for an empty list.
#[must_use]
pub fn nearest(
    candidates: &[Entity],
    point: Vec2,
    position_of: impl Fn(Entity) -> Option<Vec2>,
) -> Option<Entity> {
    candidates
        .iter()
        .copied()
        .filter_map(|e| position_of(e).map(|pos| (e, pos.distance_squared(point))))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(e, _)| e)
}

/// The nearest candidate, excluding one entity.
#[must_use]
pub fn nearest_excluding(
    candidates: &[Entity],
    point: Vec2,
    exclude: Entity,
    position_of: impl Fn(Entity) -> Option<Vec2>,
) -> Option<Entity> {
    nearest(candidates, point, |e| {
        if e == exclude { None } else { position_of(e) }
    })
}

/// The nearest candidate, or `None` when even the closest one is farther
/// than `range`.
#[must_use]
pub fn nearest_within(
    candidates: &[Entity],
    point: Vec2,
    range: f32,
    position_of: impl Fn(Entity) -> Option<Vec2>,
) -> Option<Entity> {
    let found = nearest(candidates, point, &position_of)?;
    let pos = position_of(found)?;
    (pos.distance(point) <= range).then_some(found)
}

/// The nearest candidate that passes the occlusion test.
#[must_use]
pub fn nearest_in_sight(
    candidates: &[Entity],
    point: Vec2,
    position_of: impl Fn(Entity) -> Option<Vec2>,
    can_see: impl Fn(Entity, Vec2) -> bool,
) -> Option<Entity> {
    nearest(candidates, point, |e| {
        position_of(e).filter(|&pos| can_see(e, pos))
    })
}

// === Lifecycle observers ===

fn on_add_obstacle(add: On<Add, Obstacle>, mut registry: ResMut<CombatRegistry>) {
    registry.add_obstacle(add.entity);
}

fn on_remove_obstacle(remove: On<Remove, Obstacle>, mut registry: ResMut<CombatRegistry>) {
    registry.remove_obstacle(remove.entity);
}

fn on_add_actor(add: On<Add, Actor>, mut registry: ResMut<CombatRegistry>) {
    registry.add_actor(add.entity);
}

fn on_remove_actor(remove: On<Remove, Actor>, mut registry: ResMut<CombatRegistry>) {
    registry.remove_actor(remove.entity);
}

// === Systems ===

/// Mirrors the player's pushbox contacts into the touching-player bucket.
/// Runs in `GameSet::Registry`.
fn track_player_contacts(
    mut registry: ResMut<CombatRegistry>,
    player: Query<&CollidingEntities, With<Player>>,
) {
    let Ok(colliding) = player.single() else {
        registry.set_touching_player([]);
        return;
    };
    registry.set_touching_player(colliding.0.iter().copied());
}

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.register_type::<Obstacle>().register_type::<Actor>();
    app.init_resource::<CombatRegistry>();

    app.add_observer(on_add_obstacle)
        .add_observer(on_remove_obstacle)
        .add_observer(on_add_actor)
        .add_observer(on_remove_actor);

    app.add_systems(
        Update,
        track_player_contacts
            .in_set(GameSet::Registry)
            .run_if(gameplay_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;

    fn create_registry_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<CombatRegistry>();
        app.add_observer(on_add_obstacle)
            .add_observer(on_remove_obstacle)
            .add_observer(on_add_actor)
            .add_observer(on_remove_actor);
        app
    }

    #[test]
    fn spawned_actor_is_registered() {
        let mut app = create_registry_test_app();

        let actor = app.world_mut().spawn((Actor, Team(2))).id();

        let registry = app.world().resource::<CombatRegistry>();
        assert_eq!(registry.actors(), vec![actor]);
    }

    #[test]
    fn despawned_actor_is_unregistered() {
        let mut app = create_registry_test_app();

        let actor = app.world_mut().spawn((Actor, Team(2))).id();
        app.world_mut().despawn(actor);

        let registry = app.world().resource::<CombatRegistry>();
        assert!(registry.actors().is_empty());
    }

    #[test]
    fn obstacle_bucket_tracks_lifecycle() {
        let mut app = create_registry_test_app();

        let wall = app.world_mut().spawn(Obstacle).id();
        assert_eq!(app.world().resource::<CombatRegistry>().obstacles(), vec![wall]);

        app.world_mut().despawn(wall);
        assert!(app.world().resource::<CombatRegistry>().obstacles().is_empty());
    }
}
