//! Testing utilities for Bevy systems.

#![cfg(test)]

use std::time::Duration;

use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;

/// Creates a minimal app for testing with essential plugins.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app
}

/// Advances virtual time by `dt` and runs one update, so time-driven
/// systems see an exact delta instead of wall-clock jitter.
pub fn advance_and_update(app: &mut App, dt: Duration) {
    // Advancing `Time<Virtual>` directly would be clobbered by the next
    // `time_system` run; the update strategy is what it honors.
    app.world_mut()
        .insert_resource(TimeUpdateStrategy::ManualDuration(dt));
    app.update();
}

/// Asserts how many entities match the given query filter.
pub fn assert_entity_count<F: QueryFilter>(app: &mut App, expected: usize) {
    let count = app
        .world_mut()
        .query_filtered::<Entity, F>()
        .iter(app.world())
        .count();
    assert_eq!(count, expected, "expected {expected} entities, got {count}");
}
