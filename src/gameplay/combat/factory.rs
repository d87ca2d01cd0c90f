//! Projectile archetypes: the per-kind stat table and the one spawn path
//! every gun, break cascade, and debug tool goes through.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::break_rules::{BreakRules, BreaksOn};
use super::projectile::{DamagedContacts, Lifetime, Projectile, Pushing, SpawnsOnBreak};
use super::{DamageTags, DamageType, FiredBy, SpawnedAt};
use crate::gameplay::Team;
use crate::gameplay::feedback::SoundKind;
use crate::gameplay::geometry;
use crate::theme::palette;
use crate::third_party::CollisionLayer;
use crate::{GameState, Z_PROJECTILE};

// === Kinds ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ProjectileKind {
    Bullet,
    Rocket,
    Bomb,
    Explosion,
}

// === Stats ===

/// Static definition of one projectile kind. Everything a spawned instance
/// copies comes from here; nothing is configured per-spawn except position,
/// rotation, team, and owner.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub damage: f32,
    pub lifetime_secs: f32,
    pub radius: f32,
    pub tags: &'static [DamageType],
    pub breaks_on: &'static [BreaksOn],
    pub spawns_on_break: &'static [ProjectileKind],
    pub pushing: Option<f32>,
    pub break_sounds: &'static [SoundKind],
    /// Run the break cascade when the lifetime ends, instead of vanishing
    /// silently. Bombs detonate; everything else just expires.
    pub detonates_on_expiry: bool,
}

#[must_use]
pub const fn projectile_spec(kind: ProjectileKind) -> ProjectileSpec {
    match kind {
        ProjectileKind::Bullet => ProjectileSpec {
            speed: 420.0,
            damage: 6.0,
            lifetime_secs: 1.6,
            radius: 3.0,
            tags: &[DamageType::Projectile],
            breaks_on: &[BreaksOn::Allies, BreaksOn::Enemies, BreaksOn::Obstacles],
            spawns_on_break: &[],
            pushing: None,
            break_sounds: &[SoundKind::BulletBreak],
            detonates_on_expiry: false,
        },
        ProjectileKind::Rocket => ProjectileSpec {
            speed: 260.0,
            damage: 15.0,
            lifetime_secs: 3.0,
            radius: 5.0,
            tags: &[DamageType::Projectile, DamageType::Rocket],
            breaks_on: &[
                BreaksOn::Allies,
                BreaksOn::Enemies,
                BreaksOn::Obstacles,
                BreaksOn::Explosions,
            ],
            spawns_on_break: &[ProjectileKind::Explosion],
            pushing: Some(40.0),
            break_sounds: &[SoundKind::RocketBreak],
            detonates_on_expiry: false,
        },
        // Bombs break against nothing; they detonate when their fuse runs
        // out and leave an explosion behind.
        ProjectileKind::Bomb => ProjectileSpec {
            speed: 120.0,
            damage: 0.0,
            lifetime_secs: 2.5,
            radius: 6.0,
            tags: &[DamageType::Projectile],
            breaks_on: &[],
            spawns_on_break: &[ProjectileKind::Explosion],
            pushing: None,
            break_sounds: &[SoundKind::Explosion],
            detonates_on_expiry: true,
        },
        ProjectileKind::Explosion => ProjectileSpec {
            speed: 0.0,
            damage: 12.0,
            lifetime_secs: 0.4,
            radius: 28.0,
            tags: &[DamageType::Explosion],
            breaks_on: &[],
            spawns_on_break: &[],
            pushing: Some(120.0),
            break_sounds: &[],
            detonates_on_expiry: false,
        },
    }
}

const fn kind_name(kind: ProjectileKind) -> &'static str {
    match kind {
        ProjectileKind::Bullet => "Bullet",
        ProjectileKind::Rocket => "Rocket",
        ProjectileKind::Bomb => "Bomb",
        ProjectileKind::Explosion => "Explosion",
    }
}

fn tint_for(kind: ProjectileKind, team: Team) -> Color {
    match kind {
        ProjectileKind::Explosion => palette::EXPLOSION,
        _ => palette::team_tint(team).unwrap_or_else(|| {
            if !team.is_neutral() {
                warn!("no tint configured for {team:?}, using fallback");
            }
            palette::PROJECTILE
        }),
    }
}

// === Spawning ===

/// Spawns one projectile at `position`, flying at `rotation_degrees`
/// (0 = up), owned by `team` and optionally crediting `owner` as shooter.
pub fn summon_projectile(
    commands: &mut Commands,
    kind: ProjectileKind,
    position: Vec2,
    rotation_degrees: f32,
    team: Team,
    owner: Option<Entity>,
    now: f32,
) -> Entity {
    let spec = projectile_spec(kind);
    let velocity = geometry::direction_vector(spec.speed, rotation_degrees);

    let mut entity = commands.spawn((
        Name::new(kind_name(kind)),
        Projectile {
            kind,
            damage: spec.damage,
            velocity,
        },
        team,
        FiredBy(owner),
        SpawnedAt(now),
        BreakRules(spec.breaks_on.to_vec()),
        DamageTags(spec.tags.to_vec()),
        Lifetime {
            secs: spec.lifetime_secs,
        },
        SpawnsOnBreak(spec.spawns_on_break.to_vec()),
        DamagedContacts::default(),
        Sprite::from_color(tint_for(kind, team), Vec2::splat(spec.radius * 2.0)),
        Transform::from_translation(position.extend(Z_PROJECTILE))
            .with_rotation(Quat::from_rotation_z(rotation_degrees.to_radians())),
        (
            RigidBody::Kinematic,
            Collider::circle(spec.radius),
            Sensor,
            CollisionLayers::new(
                CollisionLayer::Hitbox,
                [
                    CollisionLayer::Hurtbox,
                    CollisionLayer::Hitbox,
                    CollisionLayer::Obstacle,
                ],
            ),
            CollisionEventsEnabled,
            CollidingEntities::default(),
        ),
        DespawnOnExit(GameState::InGame),
    ));
    if let Some(power) = spec.pushing {
        entity.insert(Pushing { power });
    }
    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rocket_is_tagged_as_bullet_and_rocket() {
        let spec = projectile_spec(ProjectileKind::Rocket);
        assert!(spec.tags.contains(&DamageType::Projectile));
        assert!(spec.tags.contains(&DamageType::Rocket));
    }

    #[test]
    fn bomb_never_breaks_on_contact() {
        let spec = projectile_spec(ProjectileKind::Bomb);
        assert!(spec.breaks_on.is_empty());
        assert_eq!(spec.spawns_on_break, &[ProjectileKind::Explosion]);
    }

    #[test]
    fn explosion_cascade_terminates() {
        // The break cascade must bottom out: explosions spawn nothing.
        let spec = projectile_spec(ProjectileKind::Explosion);
        assert!(spec.spawns_on_break.is_empty());
        assert!(spec.breaks_on.is_empty());
    }

    #[test]
    fn explosions_push() {
        assert!(projectile_spec(ProjectileKind::Explosion).pushing.is_some());
        assert!(projectile_spec(ProjectileKind::Bullet).pushing.is_none());
    }
}
