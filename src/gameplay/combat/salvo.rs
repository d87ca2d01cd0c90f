//! Salvo firing and the reload time-bank economy.
//!
//! A gun owns an ordered list of shots. Firing a shot spends its delay from
//! a time bank and starts that delay as a cooldown before the next shot; an
//! empty bank refuses to fire. Reload refills the bank,
//! either all at once or one shot at a time, measured against the wall
//! clock from the moment of the last shot. All of the arithmetic lives on
//! [`SalvoState`] as pure methods over an explicit `now`, so the economy is
//! testable to the exact second.

use bevy::prelude::*;

use super::factory::{ProjectileKind, summon_projectile};
use super::{Destroyed, FiredBy};
use crate::gameplay::feedback::{PlaySoundRequest, SoundKind, random_variant};
use crate::gameplay::geometry;
use crate::gameplay::{Facing, Team};
use crate::{GameSet, gameplay_running};

// === Constants ===

/// Slack for accumulated float error when comparing the bank to a cost.
const BANK_EPSILON: f32 = 1e-4;

// === Definition ===

/// How a multi-projectile shot fans out.
#[derive(Debug, Clone, Reflect)]
pub enum SpreadPolicy {
    /// Fixed angular step, centered on the aim direction.
    Even { spread_degrees: f32 },
    /// Independent uniform offset per projectile, `left` opening toward −X.
    Random { left: f32, right: f32 },
}

/// One shot in a salvo: what it launches, how it fans, what it sounds like,
/// and its delay (both the firing cost and the per-shot reload price).
#[derive(Debug, Clone, Reflect)]
pub struct ShotDef {
    pub projectiles: Vec<ProjectileKind>,
    pub spread: SpreadPolicy,
    pub sounds: Vec<SoundKind>,
    pub sound_volume: f32,
    pub delay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ReloadPolicy {
    /// The whole salvo comes back in one step once the full wait has passed.
    AllAtOnce,
    /// Shots drip back one at a time, most recently fired first.
    Incremental,
}

/// Static loadout of one gun.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SalvoDefinition {
    pub shots: Vec<ShotDef>,
    pub reload: ReloadPolicy,
    /// Flat extra wait added on top of per-shot delays before any reload.
    pub additional_reload_time: f32,
}

impl SalvoDefinition {
    /// Bank value of the full salvo.
    #[must_use]
    pub fn total_cost(&self) -> f32 {
        self.shots.iter().map(|shot| shot.delay).sum()
    }

    /// Sum of the first `n` shot delays, with `n` clamped to
    /// `[0, shots.len() - 1]`. The last shot's delay never counts toward
    /// a reload wait; it already elapsed as that shot's own cooldown.
    #[must_use]
    pub fn prefix_cost(&self, n: usize) -> f32 {
        let n = n.min(self.shots.len().saturating_sub(1));
        self.shots.iter().take(n).map(|shot| shot.delay).sum()
    }
}

// === State ===

/// Mutable firing state of one gun.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct SalvoState {
    /// Index of the next shot to fire; equals `shots.len()` when empty.
    pub shot_index: usize,
    /// Remaining spendable delay-seconds.
    pub time_bank: f32,
    /// Reload reference point. Advanced artificially by incremental steps.
    pub last_shot_time: f32,
    /// Post-shot cooldown deadline; the next shot waits for it.
    pub next_ready_at: f32,
}

impl SalvoState {
    /// A freshly loaded gun, ready to fire immediately.
    #[must_use]
    pub fn new(definition: &SalvoDefinition, now: f32) -> Self {
        Self {
            shot_index: 0,
            time_bank: definition.total_cost(),
            last_shot_time: now,
            next_ready_at: now,
        }
    }

    /// Whether the next shot can be paid for right now: bank sufficient and
    /// the previous shot's cooldown elapsed.
    #[must_use]
    pub fn can_fire(&self, definition: &SalvoDefinition, now: f32) -> bool {
        let Some(shot) = definition.shots.get(self.shot_index) else {
            return false;
        };
        now + BANK_EPSILON >= self.next_ready_at && self.time_bank + BANK_EPSILON >= shot.delay
    }

    /// Fires the next shot if the bank affords it, spending its delay,
    /// stamping the reload reference, and starting the post-shot cooldown.
    pub fn fire<'def>(
        &mut self,
        definition: &'def SalvoDefinition,
        now: f32,
    ) -> Option<&'def ShotDef> {
        if !self.can_fire(definition, now) {
            return None;
        }
        let shot = &definition.shots[self.shot_index];
        self.time_bank = (self.time_bank - shot.delay).max(0.0);
        self.shot_index += 1;
        self.last_shot_time = now;
        self.next_ready_at = now + shot.delay;
        Some(shot)
    }

    /// Advances the reload economy. Call once per tick; incremental reload
    /// restores at most one shot per call.
    pub fn reload(&mut self, definition: &SalvoDefinition, now: f32) {
        if self.shot_index == 0 {
            return;
        }
        let since_last = now - self.last_shot_time;
        match definition.reload {
            ReloadPolicy::AllAtOnce => {
                let wait =
                    definition.additional_reload_time + definition.prefix_cost(self.shot_index - 1);
                if since_last + BANK_EPSILON >= wait {
                    self.shot_index = 0;
                    self.time_bank = definition.total_cost();
                }
            }
            ReloadPolicy::Incremental => {
                let delay = definition.shots[self.shot_index - 1].delay;
                if since_last + BANK_EPSILON >= definition.additional_reload_time + delay {
                    self.time_bank += delay;
                    self.shot_index -= 1;
                    // Shift the reference instead of resetting it, so a long
                    // idle stretch pays for several drip steps in a row.
                    self.last_shot_time += delay;
                }
            }
        }
    }
}

// === Gun Components ===

/// A barrel mounted under a turret. Its rest rotation is relative to the
/// turret's facing.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Gun {
    pub basic_rotation: f32,
}

/// Fire gate, written by the owning turret every tick. The gun fires as
/// long as this is true and the bank affords it.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct FireCommand(pub bool);

// === Systems ===

/// Spread offset for projectile `i` of `count` under an even fan.
#[must_use]
pub fn even_spread_offset(spread_degrees: f32, i: usize, count: usize) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let centered = i as f32 - (count as f32 - 1.0) / 2.0;
    spread_degrees * centered
}

/// Runs every gun's economy: reload, then fire if commanded and affordable.
/// Projectiles launch from the gun's world position along the turret's
/// facing plus the gun's rest rotation plus the per-projectile spread.
fn tick_guns(
    mut commands: Commands,
    time: Res<Time>,
    mut sounds: MessageWriter<PlaySoundRequest>,
    mut guns: Query<
        (
            Entity,
            &Gun,
            &SalvoDefinition,
            &mut SalvoState,
            &FireCommand,
            &FiredBy,
            &Team,
            &GlobalTransform,
        ),
        Without<Destroyed>,
    >,
    parents: Query<&ChildOf>,
    facings: Query<&Facing>,
) {
    let now = time.elapsed_secs();
    let mut rng = rand::rng();
    for (entity, gun, definition, mut state, command, &fired_by, &team, global) in &mut guns {
        state.reload(definition, now);
        if !command.0 {
            continue;
        }
        let Some(shot) = state.fire(definition, now) else {
            continue;
        };

        let turret_facing = parents
            .get(entity)
            .and_then(|child_of| facings.get(child_of.parent()))
            .map_or(0.0, |facing| facing.0);
        let aim = geometry::normalize_angle(turret_facing + gun.basic_rotation);
        let muzzle = global.translation().truncate();

        let count = shot.projectiles.len();
        for (i, &kind) in shot.projectiles.iter().enumerate() {
            let offset = match shot.spread {
                SpreadPolicy::Even { spread_degrees } => {
                    even_spread_offset(spread_degrees, i, count)
                }
                SpreadPolicy::Random { left, right } => {
                    geometry::random_angle_in_range(&mut rng, left, right)
                }
            };
            summon_projectile(
                &mut commands,
                kind,
                muzzle,
                geometry::normalize_angle(aim + offset),
                team,
                fired_by.0,
                now,
            );
        }

        if let Some(kind) = random_variant(&mut rng, &shot.sounds) {
            sounds.write(PlaySoundRequest::new(kind, muzzle).with_volume(shot.sound_volume));
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<SalvoDefinition>()
        .register_type::<SalvoState>()
        .register_type::<Gun>()
        .register_type::<FireCommand>();

    app.add_systems(
        Update,
        tick_guns.in_set(GameSet::Combat).run_if(gameplay_running),
    );
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::gameplay::combat::projectile::Projectile;
    use crate::gameplay::registry::CombatRegistry;
    use crate::testing::{advance_and_update, assert_entity_count, create_test_app};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn create_gun_test_app() -> App {
        let mut app = create_test_app();
        app.init_resource::<CombatRegistry>();
        app.add_message::<PlaySoundRequest>();
        app.add_systems(Update, tick_guns);
        app.update(); // Initialize time
        app
    }

    fn single_bullet_definition() -> SalvoDefinition {
        SalvoDefinition {
            shots: vec![ShotDef {
                projectiles: vec![ProjectileKind::Bullet],
                spread: SpreadPolicy::Even {
                    spread_degrees: 0.0,
                },
                sounds: vec![],
                sound_volume: 1.0,
                delay: 0.5,
            }],
            reload: ReloadPolicy::AllAtOnce,
            additional_reload_time: 1.0,
        }
    }

    fn spawn_gun(world: &mut World, definition: SalvoDefinition, firing: bool) -> Entity {
        let now = world.resource::<Time>().elapsed_secs();
        let state = SalvoState::new(&definition, now);
        world
            .spawn((
                Gun::default(),
                definition,
                state,
                FireCommand(firing),
                FiredBy(None),
                Team(1),
                Transform::default(),
                GlobalTransform::from_xyz(3.0, 4.0, 0.0),
            ))
            .id()
    }

    #[test]
    fn commanded_gun_fires_from_its_muzzle() {
        let mut app = create_gun_test_app();
        spawn_gun(app.world_mut(), single_bullet_definition(), true);

        advance_and_update(&mut app, Duration::from_millis(16));

        let mut spawned = app.world_mut().query::<(&Projectile, &Transform)>();
        let (_, transform) = spawned.single(app.world()).unwrap();
        assert_eq!(transform.translation.truncate(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn idle_gun_holds_fire() {
        let mut app = create_gun_test_app();
        spawn_gun(app.world_mut(), single_bullet_definition(), false);

        advance_and_update(&mut app, Duration::from_millis(16));

        assert_entity_count::<With<Projectile>>(&mut app, 0);
    }

    #[test]
    fn gun_aims_with_its_parent_turret() {
        let mut app = create_gun_test_app();
        let gun = spawn_gun(app.world_mut(), single_bullet_definition(), true);
        let turret = app.world_mut().spawn(Facing(90.0)).add_child(gun).id();
        let _ = turret;

        advance_and_update(&mut app, Duration::from_millis(16));

        let mut spawned = app.world_mut().query::<&Projectile>();
        let projectile = spawned.single(app.world()).unwrap();
        // Facing 90 points toward -X.
        assert!(projectile.velocity.x < 0.0);
        assert!(projectile.velocity.y.abs() < 1e-3);
    }

    #[test]
    fn empty_gun_stops_until_reloaded() {
        let mut app = create_gun_test_app();
        spawn_gun(app.world_mut(), single_bullet_definition(), true);

        // First tick fires the only shot; the next ticks cannot afford one.
        advance_and_update(&mut app, Duration::from_millis(16));
        advance_and_update(&mut app, Duration::from_millis(16));
        assert_entity_count::<With<Projectile>>(&mut app, 1);

        // After the reload wait (1.0 additional, no prefix) it fires again.
        advance_and_update(&mut app, Duration::from_millis(1100));
        advance_and_update(&mut app, Duration::from_millis(16));
        assert_entity_count::<With<Projectile>>(&mut app, 2);
    }

    #[test]
    fn multi_projectile_shot_fans_out() {
        let mut app = create_gun_test_app();
        let definition = SalvoDefinition {
            shots: vec![ShotDef {
                projectiles: vec![ProjectileKind::Bullet; 3],
                spread: SpreadPolicy::Even {
                    spread_degrees: 10.0,
                },
                sounds: vec![],
                sound_volume: 1.0,
                delay: 0.5,
            }],
            reload: ReloadPolicy::AllAtOnce,
            additional_reload_time: 1.0,
        };
        spawn_gun(app.world_mut(), definition, true);

        advance_and_update(&mut app, Duration::from_millis(16));

        let mut spawned = app.world_mut().query::<&Projectile>();
        let mut angles: Vec<f32> = spawned
            .iter(app.world())
            .map(|p| crate::gameplay::geometry::angle_from_up(p.velocity))
            .collect();
        angles.sort_by(f32::total_cmp);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] - (-10.0)).abs() < 1e-3);
        assert!(angles[1].abs() < 1e-3);
        assert!((angles[2] - 10.0).abs() < 1e-3);
    }
}
