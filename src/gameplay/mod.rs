//! Gameplay domain: shared combat vocabulary plus the combat core plugins.

pub mod actors;
pub mod arena;
pub mod combat;
pub mod feedback;
pub mod geometry;
pub mod registry;

use bevy::prelude::*;

// === Shared Components ===

/// Allegiance as an integer partition. `0` is neutral/unowned; any other
/// value is a faction. Equality is the only relationship that matters.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub struct Team(pub i32);

impl Team {
    /// Neutral / no-team.
    pub const NEUTRAL: Self = Self(0);
    /// The player's faction.
    pub const PLAYER: Self = Self(1);

    /// Two entities are allied iff their team numbers are equal.
    #[must_use]
    pub const fn allied_with(self, other: Self) -> bool {
        self.0 == other.0
    }

    #[must_use]
    pub const fn is_neutral(self) -> bool {
        self.0 == 0
    }
}

/// Health pool. `current` may transiently go negative before the destruction
/// check runs; it never exceeds `max`.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }
}

/// World-space facing angle in degrees, 0 = up, normalized to (-180, 180].
/// Turrets, actors, and gun middles are all expressed through this.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Facing(pub f32);

/// Marker: this entity's velocity accepts knockback from pushing damage.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Pushable;

/// Marker for the player-controlled vessel.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Multiplier applied to the player's speed while touching this entity.
/// `1.0` is no effect; smaller is slower.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct SlowEffect(pub f32);

// === Plugin ===

pub fn plugin(app: &mut App) {
    app.register_type::<Team>()
        .register_type::<Health>()
        .register_type::<Facing>()
        .register_type::<Pushable>()
        .register_type::<Player>()
        .register_type::<SlowEffect>();

    app.add_plugins((
        registry::plugin,
        feedback::plugin,
        combat::plugin,
        actors::plugin,
        arena::plugin,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn health_new_sets_current_to_max() {
        let health = Health::new(100.0);
        assert_eq!(health.current, 100.0);
        assert_eq!(health.max, 100.0);
    }

    #[test]
    fn team_equality_is_alliance() {
        assert!(Team(2).allied_with(Team(2)));
        assert!(!Team(1).allied_with(Team(2)));
        assert!(Team::NEUTRAL.allied_with(Team(0)));
    }

    #[test]
    fn team_zero_is_neutral() {
        assert!(Team::NEUTRAL.is_neutral());
        assert!(!Team::PLAYER.is_neutral());
    }
}
