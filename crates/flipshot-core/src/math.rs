//! Table-space vectors and angle helpers.
//!
//! Coordinate system:
//! - X: across the table (positive to the right)
//! - Y: vertical (positive upward)
//! - Z: along the table (positive away from the player)
//!
//! Screen positions use [`Vec2`] in pixels.

pub use glam::{Vec2, Vec3};

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-6;

pub fn clamp01(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Shortest signed difference `to - from` in degrees, in `(-180, 180]`.
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Unsigned shortest angular distance in degrees, in `[0, 180]`.
pub fn angular_distance(a: f32, b: f32) -> f32 {
    delta_angle(a, b).abs()
}

/// Interpolate between two angles along the shortest arc. `t` is clamped.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    from + delta_angle(from, to) * clamp01(t)
}
