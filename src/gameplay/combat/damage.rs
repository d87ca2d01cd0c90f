//! Damage resolution: turning health deltas into destructions, death
//! cascades, team propagation, and the tick-end despawn.

use bevy::prelude::*;

use super::factory::{ProjectileKind, summon_projectile};
use super::{DespawnAtTickEnd, Destroyed};
use crate::gameplay::Health;
use crate::gameplay::Team;
use crate::gameplay::feedback::{PlaySoundRequest, SoundKind};
use crate::{GameSet, gameplay_running};

// === Components ===

/// Kinds spawned at this entity's position when it is destroyed. A mined
/// hull leaves an explosion behind; most actors leave nothing.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SpawnsOnDeath(pub Vec<ProjectileKind>);

// === Systems ===

/// Latches destruction exactly once per entity. Health may be driven
/// negative by several hits in one tick; the `Destroyed` latch plus the
/// `Without` filter guarantee a single destruction, a single death sound,
/// and a single death cascade.
fn check_destruction(
    mut commands: Commands,
    time: Res<Time>,
    mut sounds: MessageWriter<PlaySoundRequest>,
    damaged: Query<
        (
            Entity,
            &Health,
            &Transform,
            Option<&Team>,
            Option<&SpawnsOnDeath>,
        ),
        (Changed<Health>, Without<Destroyed>),
    >,
) {
    let now = time.elapsed_secs();
    for (entity, health, transform, team, spawns) in &damaged {
        let position = transform.translation.truncate();
        if health.current > 0.0 {
            if health.current < health.max {
                sounds.write(PlaySoundRequest::new(SoundKind::ActorHit, position));
            }
            continue;
        }

        commands.entity(entity).insert((Destroyed, DespawnAtTickEnd));
        sounds.write(PlaySoundRequest::new(SoundKind::ActorDestroyed, position));

        if let Some(spawns) = spawns {
            let team = team.copied().unwrap_or(Team::NEUTRAL);
            for &kind in &spawns.0 {
                summon_projectile(&mut commands, kind, position, 0.0, team, None, now);
            }
        }
    }
}

/// Pushes a root's team change down through its descendants. Setting the
/// team on a vessel recolors its turrets and guns in the same pass;
/// `set_if_neq` keeps already-correct descendants from re-triggering.
fn propagate_team_changes(
    mut teams: ParamSet<(
        Query<(&Team, &Children), Changed<Team>>,
        Query<&mut Team>,
    )>,
    children_query: Query<&Children>,
) {
    let mut updates: Vec<(Entity, Team)> = Vec::new();
    for (&team, children) in teams.p0().iter() {
        let mut stack: Vec<Entity> = children.iter().collect();
        while let Some(entity) = stack.pop() {
            updates.push((entity, team));
            if let Ok(grandchildren) = children_query.get(entity) {
                stack.extend(grandchildren.iter());
            }
        }
    }
    let mut writable = teams.p1();
    for (entity, team) in updates {
        if let Ok(mut current) = writable.get_mut(entity) {
            current.set_if_neq(team);
        }
    }
}

/// Removes everything marked during this tick. Runs last so every system
/// saw a consistent world: destroyed entities exist all tick, gone by the
/// next one.
fn despawn_at_tick_end(mut commands: Commands, marked: Query<Entity, With<DespawnAtTickEnd>>) {
    for entity in &marked {
        commands.entity(entity).despawn();
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<SpawnsOnDeath>();

    app.add_systems(
        Update,
        (check_destruction, propagate_team_changes)
            .in_set(GameSet::Damage)
            .run_if(gameplay_running),
    );
    app.add_systems(
        Update,
        despawn_at_tick_end
            .in_set(GameSet::Cleanup)
            .run_if(gameplay_running),
    );
}
