//! Combat core: projectiles, break rules, damage resolution, turrets, and
//! salvo-firing guns.
//!
//! Frame order inside a tick: turrets aim and gate fire (`Targeting`), guns
//! fire and projectiles move/collide (`Combat`), health deltas resolve into
//! destructions (`Damage`), and everything marked for removal despawns at
//! the end of the frame (`Cleanup`). A destroyed entity keeps participating
//! in nothing but is only removed from the world once, at tick end.

pub mod bars;
pub mod break_rules;
pub mod damage;
pub mod factory;
pub mod projectile;
pub mod salvo;
pub mod turret;

use bevy::prelude::*;

// === Components ===

/// What flavor of harm a projectile carries. Break rules match against
/// these, not against concrete projectile kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DamageType {
    Projectile,
    Explosion,
    Rocket,
}

/// The damage-type tags a piece of ordnance carries. A rocket is tagged
/// both `Projectile` and `Rocket`; break rules test membership.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct DamageTags(pub Vec<DamageType>);

impl DamageTags {
    #[must_use]
    pub fn contains(&self, damage_type: DamageType) -> bool {
        self.0.contains(&damage_type)
    }
}

/// One-shot destruction latch. Inserted exactly once; systems check it
/// before applying effects so nothing dies twice in a tick.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Destroyed;

/// The entity that fired this projectile, if it still matters. Used for
/// the owner grace window and to exclude the shooter from sight casts.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct FiredBy(pub Option<Entity>);

/// Elapsed-time stamp taken at spawn, for age-based rules.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SpawnedAt(pub f32);

/// Marks an entity for removal at the end of the current tick. Destruction
/// effects run first; the actual despawn is deferred to `Cleanup`.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAtTickEnd;

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.register_type::<DamageType>()
        .register_type::<DamageTags>()
        .register_type::<Destroyed>()
        .register_type::<FiredBy>()
        .register_type::<SpawnedAt>()
        .register_type::<DespawnAtTickEnd>();

    app.add_plugins((
        projectile::plugin,
        damage::plugin,
        turret::plugin,
        salvo::plugin,
        bars::plugin,
    ));
}
