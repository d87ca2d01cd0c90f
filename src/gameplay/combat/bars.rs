//! Status bars floating over combat entities: health on hulls, reload
//! progress on guns. Bars are spawned by observers when the tracked
//! component appears and scale their fill each frame.

use bevy::prelude::*;

use super::salvo::SalvoState;
use crate::gameplay::Health;
use crate::theme::palette;
use crate::{GameSet, gameplay_running};

// === Components ===

/// Sizing for a health bar. Required alongside `Health` on anything that
/// should show one; hulls opt in, projectiles don't carry it.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HealthBarConfig {
    pub width: f32,
    pub height: f32,
    pub y_offset: f32,
}

/// Marker: full-width backdrop showing missing health.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct HealthBarBackground;

/// Marker: fill scaled by current/max health.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct HealthBarFill;

/// Sizing for a gun's reload bar, plus the bank value that counts as full.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ReloadBarConfig {
    pub width: f32,
    pub height: f32,
    pub y_offset: f32,
    pub total_cost: f32,
}

/// Marker: fill scaled by banked reload time.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ReloadBarFill;

// === Systems ===

/// Spawns the bar pair under any entity that gains `Health` and carries a
/// `HealthBarConfig`.
fn spawn_health_bars(
    add: On<Add, Health>,
    configs: Query<&HealthBarConfig>,
    mut commands: Commands,
) {
    let Ok(config) = configs.get(add.entity) else {
        return; // Health without a bar (projectile-like entities)
    };
    commands.entity(add.entity).with_children(|parent| {
        parent.spawn((
            Name::new("Health Bar Background"),
            Sprite::from_color(
                palette::HEALTH_BAR_BACKGROUND,
                Vec2::new(config.width, config.height),
            ),
            Transform::from_xyz(0.0, config.y_offset, 1.0),
            HealthBarBackground,
        ));
        parent.spawn((
            Name::new("Health Bar Fill"),
            Sprite::from_color(
                palette::HEALTH_BAR_FILL,
                Vec2::new(config.width, config.height),
            ),
            Transform::from_xyz(0.0, config.y_offset, 1.1),
            HealthBarFill,
        ));
    });
}

/// Spawns the reload indicator under a gun when its salvo state appears.
fn spawn_reload_bars(
    add: On<Add, SalvoState>,
    configs: Query<&ReloadBarConfig>,
    mut commands: Commands,
) {
    let Ok(config) = configs.get(add.entity) else {
        return;
    };
    commands.entity(add.entity).with_children(|parent| {
        parent.spawn((
            Name::new("Reload Bar Background"),
            Sprite::from_color(
                palette::RELOAD_BAR_BACKGROUND,
                Vec2::new(config.width, config.height),
            ),
            Transform::from_xyz(0.0, config.y_offset, 1.0),
            HealthBarBackground,
        ));
        parent.spawn((
            Name::new("Reload Bar Fill"),
            Sprite::from_color(
                palette::RELOAD_BAR_FILL,
                Vec2::new(config.width, config.height),
            ),
            Transform::from_xyz(0.0, config.y_offset, 1.1),
            ReloadBarFill,
        ));
    });
}

/// Scales a left-aligned fill bar: `scale.x` shrinks with the ratio and
/// the sprite shifts left so the bar empties toward the right.
fn align_fill(transform: &mut Transform, width: f32, ratio: f32) {
    transform.scale.x = ratio;
    transform.translation.x = width.mul_add(-(1.0 - ratio), 0.0) / 2.0;
}

fn update_health_bars(
    hulls: Query<(&Health, &Children, &HealthBarConfig)>,
    mut fills: Query<&mut Transform, With<HealthBarFill>>,
) {
    for (health, children, config) in &hulls {
        let ratio = (health.current / health.max).clamp(0.0, 1.0);
        for child in children.iter() {
            if let Ok(mut transform) = fills.get_mut(child) {
                align_fill(&mut transform, config.width, ratio);
            }
        }
    }
}

fn update_reload_bars(
    guns: Query<(&SalvoState, &Children, &ReloadBarConfig)>,
    mut fills: Query<&mut Transform, With<ReloadBarFill>>,
) {
    for (state, children, config) in &guns {
        let ratio = if config.total_cost > 0.0 {
            (state.time_bank / config.total_cost).clamp(0.0, 1.0)
        } else {
            1.0
        };
        for child in children.iter() {
            if let Ok(mut transform) = fills.get_mut(child) {
                align_fill(&mut transform, config.width, ratio);
            }
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HealthBarConfig>()
        .register_type::<HealthBarBackground>()
        .register_type::<HealthBarFill>()
        .register_type::<ReloadBarConfig>()
        .register_type::<ReloadBarFill>();

    app.add_observer(spawn_health_bars);
    app.add_observer(spawn_reload_bars);

    app.add_systems(
        Update,
        (update_health_bars, update_reload_bars)
            .in_set(GameSet::Ui)
            .run_if(gameplay_running),
    );
}
