//! Pure 2D geometry and angle utilities.
//!
//! Angle convention: degrees, 0 = "up" (+Y), positive angles rotate toward
//! −X (counter-clockwise), all normalized angles live in (-180, 180].
//! [`direction_vector`] and [`angle_from_up`] are exact inverses — the aiming
//! and spread code composes them and relies on that.

use bevy::prelude::*;
use rand::Rng;

/// Planar delta from `from` to `to`, ignoring the Z axis.
#[must_use]
pub fn delta(from: Vec3, to: Vec3) -> Vec2 {
    to.truncate() - from.truncate()
}

/// Planar distance between two points, ignoring the Z axis.
#[must_use]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    delta(a, b).length()
}

/// A vector of the given magnitude pointing at `angle_degrees`.
#[must_use]
pub fn direction_vector(magnitude: f32, angle_degrees: f32) -> Vec2 {
    let radians = angle_degrees.to_radians();
    magnitude * Vec2::new(-radians.sin(), radians.cos())
}

/// Signed angle in (-180, 180] from "up" to the given delta vector.
/// Returns 0 for the zero vector.
#[must_use]
pub fn angle_from_up(delta: Vec2) -> f32 {
    if delta == Vec2::ZERO {
        return 0.0;
    }
    normalize_angle((-delta.x).atan2(delta.y).to_degrees())
}

/// Normalizes an angle into (-180, 180].
#[must_use]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Shortest signed rotation that takes `from` to `to`, in (-180, 180].
#[must_use]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Uniform random angle in `[-right_spread, left_spread]`. The middle (0) is
/// "up"; `left_spread` opens toward −X and `right_spread` toward +X.
/// Degenerate spreads (both zero, or inverted) yield the midpoint.
#[must_use]
pub fn random_angle_in_range(rng: &mut impl Rng, left_spread: f32, right_spread: f32) -> f32 {
    let (low, high) = (-right_spread, left_spread);
    if high <= low {
        return f32::midpoint(low, high);
    }
    rng.random_range(low..=high)
}
