//! Color palette, including the per-team tint table.
//!
//! The tint table is a deliberately bounded configuration surface: teams are
//! arbitrary integers, the table is not. Lookups return `Option` so callers
//! decide the fallback instead of indexing blindly.

use bevy::prelude::*;

use crate::gameplay::Team;

// === General ===

/// Untinted projectile color (neutral / out-of-table teams).
pub const PROJECTILE: Color = Color::srgb(1.0, 1.0, 0.3);

/// Obstacle fill color.
pub const OBSTACLE: Color = Color::srgb(0.35, 0.35, 0.4);

/// Explosion flash color.
pub const EXPLOSION: Color = Color::srgb(1.0, 0.6, 0.1);

/// Turret barrel color.
pub const TURRET: Color = Color::srgb(0.6, 0.6, 0.65);

// === Bars ===

/// Missing-health backdrop.
pub const HEALTH_BAR_BACKGROUND: Color = Color::srgb(0.8, 0.1, 0.1);

/// Remaining-health fill.
pub const HEALTH_BAR_FILL: Color = Color::srgb(0.1, 0.9, 0.1);

/// Spent-ammunition backdrop.
pub const RELOAD_BAR_BACKGROUND: Color = Color::srgb(0.2, 0.2, 0.25);

/// Banked-ammunition fill.
pub const RELOAD_BAR_FILL: Color = Color::srgb(0.9, 0.8, 0.2);

// === Team tints ===

/// Tint per team, indexed by `team - 1` (team 0 is neutral and untinted).
const TEAM_TINTS: &[Color] = &[
    Color::srgb(0.2, 0.8, 0.2), // team 1 — player green
    Color::srgb(0.8, 0.2, 0.2), // team 2 — hostile red
    Color::srgb(0.3, 0.4, 0.9), // team 3 — rival blue
];

/// Tint for the given team, or `None` when the team has no table entry
/// (neutral, or a team number beyond the configured tints).
#[must_use]
pub fn team_tint(team: Team) -> Option<Color> {
    if team.0 <= 0 {
        return None;
    }
    let index = usize::try_from(team.0 - 1).ok()?;
    TEAM_TINTS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn neutral_team_has_no_tint() {
        assert_eq!(team_tint(Team::NEUTRAL), None);
    }

    #[test]
    fn player_team_is_tinted() {
        assert!(team_tint(Team::PLAYER).is_some());
    }

    #[test]
    fn out_of_table_team_has_no_tint() {
        assert_eq!(team_tint(Team(99)), None);
        assert_eq!(team_tint(Team(-3)), None);
    }
}
