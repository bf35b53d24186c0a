//! Mathematical primitives for 2D SLAM operations.
//!
//! Angle wrapping and angular arithmetic shared by registration and the
//! pose graph.

use std::f64::consts::{PI, TAU};

/// Wrap an angle into the half-open interval (-π, π].
///
/// # Example
/// ```
/// use drishti_slam::core::math::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-9);
/// assert!((normalize_angle(-PI) - PI).abs() < 1e-9);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if a > PI { a - TAU } else { a }
}

/// Shortest signed angular difference from `a` to `b`.
#[inline]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    normalize_angle(b - a)
}
