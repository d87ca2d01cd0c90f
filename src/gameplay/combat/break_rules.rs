//! Declarative break rules: what a projectile shatters against.
//!
//! Evaluation is a pure function over a description of the touched entity,
//! so the whole rule table is testable without a world. Categories are
//! checked in a fixed order: terrain first, then damageable actors, then
//! other ordnance. The first matching rule breaks the projectile.

use bevy::prelude::*;

use super::{DamageTags, DamageType};
use crate::gameplay::Team;

// === Constants ===

/// For this long after firing, a projectile will not break against allied
/// actors. Prevents shattering on the shooter's own hull at the muzzle.
pub const OWNER_GRACE_SECS: f32 = 0.1;

// === Components ===

/// One category of contact a projectile breaks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum BreaksOn {
    Allies,
    Enemies,
    AllyBullets,
    EnemyBullets,
    Explosions,
    Rockets,
    Obstacles,
}

/// The full rule set for one projectile. Checked per contact; an empty set
/// means the projectile flies through everything until its lifetime ends.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct BreakRules(pub Vec<BreaksOn>);

impl BreakRules {
    #[must_use]
    pub fn breaks_on(&self, rule: BreaksOn) -> bool {
        self.0.contains(&rule)
    }
}

// === Contact description ===

/// Everything the evaluator needs to know about the touched entity,
/// gathered by the collision system before evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contact<'a> {
    /// Touched entity is terrain.
    pub is_obstacle: bool,
    /// Touched entity is a damageable actor.
    pub is_actor: bool,
    /// Touched entity's team, when it has one.
    pub team: Option<Team>,
    /// Damage tags when the touched entity is itself ordnance.
    pub tags: Option<&'a DamageTags>,
    /// Touched entity is the one that fired this projectile.
    pub is_owner: bool,
}

// === Evaluation ===

/// Decides whether a projectile with `rules`, on `team`, alive for
/// `age_secs`, breaks against the described contact.
#[must_use]
pub fn should_break(rules: &BreakRules, team: Team, age_secs: f32, contact: &Contact) -> bool {
    if contact.is_obstacle {
        return rules.breaks_on(BreaksOn::Obstacles);
    }

    if contact.is_actor {
        let allied = contact.team.is_some_and(|t| t.allied_with(team));
        if allied {
            // The grace window covers the creator only; a nearby ally
            // standing at the muzzle still breaks the shot.
            let in_grace = contact.is_owner && age_secs < OWNER_GRACE_SECS;
            return rules.breaks_on(BreaksOn::Allies) && !in_grace;
        }
        return rules.breaks_on(BreaksOn::Enemies);
    }

    if let Some(tags) = contact.tags {
        let allied = contact.team.is_some_and(|t| t.allied_with(team));
        if tags.contains(DamageType::Explosion) && rules.breaks_on(BreaksOn::Explosions) {
            return true;
        }
        if tags.contains(DamageType::Rocket) && rules.breaks_on(BreaksOn::Rockets) {
            return true;
        }
        if tags.contains(DamageType::Projectile) {
            let rule = if allied {
                BreaksOn::AllyBullets
            } else {
                BreaksOn::EnemyBullets
            };
            return rules.breaks_on(rule);
        }
    }

    false
}
