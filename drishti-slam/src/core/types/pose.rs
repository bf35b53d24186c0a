//! Pose and point types for 2D SLAM.

use nalgebra::{Matrix2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;

/// A 2D point in map units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// View as a column vector.
    #[inline]
    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Rigid 2D transform / robot pose, an element of SE(2).
///
/// Position (x, y) and heading `theta` in radians. Theta is kept in
/// (-π, π] by every constructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X translation
    pub x: f64,
    /// Y translation
    pub y: f64,
    /// Heading in radians, normalized to (-π, π]
    pub theta: f64,
}

impl Pose2D {
    /// Create a new pose with theta normalized to (-π, π].
    #[inline]
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Build from a rotation matrix and a translation.
    ///
    /// The angle is read from the first column, so any proper rotation
    /// round-trips through [`Pose2D::rotation_matrix`].
    pub fn from_rotation_translation(rotation: &Matrix2<f64>, translation: &Vector2<f64>) -> Self {
        Self::new(
            translation.x,
            translation.y,
            rotation[(1, 0)].atan2(rotation[(0, 0)]),
        )
    }

    /// Build from the `[x, y, theta]` vector form.
    #[inline]
    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Vector form `[x, y, theta]` (the `t2v` map).
    #[inline]
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.theta)
    }

    /// 2x2 rotation matrix of the heading.
    #[inline]
    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        let (s, c) = self.theta.sin_cos();
        Matrix2::new(c, -s, s, c)
    }

    /// Translation as a column vector.
    #[inline]
    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Length of the translation component.
    #[inline]
    pub fn translation_norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Compose two poses: self ⊕ other
    ///
    /// Applies `other` in the frame of `self`, so that
    /// `a.compose(&b).transform_point(p) == a.transform_point(&b.transform_point(p))`.
    /// ```text
    /// C = A ⊕ B:
    ///   C.x = A.x + B.x * cos(A.θ) - B.y * sin(A.θ)
    ///   C.y = A.y + B.x * sin(A.θ) + B.y * cos(A.θ)
    ///   C.θ = normalize(A.θ + B.θ)
    /// ```
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse of this pose.
    /// ```text
    /// A⁻¹:
    ///   x = -A.x * cos(A.θ) - A.y * sin(A.θ)
    ///   y =  A.x * sin(A.θ) - A.y * cos(A.θ)
    ///   θ = -A.θ
    /// ```
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Pose of `other` expressed in the frame of `self`: self⁻¹ ⊕ other.
    #[inline]
    pub fn between(&self, other: &Pose2D) -> Pose2D {
        self.inverse().compose(other)
    }

    /// Transform a point from local frame to global frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }

    /// Transform a point from global frame to local frame.
    #[inline]
    pub fn inverse_transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        Point2D::new(dx * cos_t + dy * sin_t, -dx * sin_t + dy * cos_t)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_pose_compose_identity() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let result = p.compose(&Pose2D::identity());
        assert_relative_eq!(result.x, p.x);
        assert_relative_eq!(result.y, p.y);
        assert_relative_eq!(result.theta, p.theta);
    }

    #[test]
    fn test_pose_inverse_roundtrip() {
        let p = Pose2D::new(1.0, 2.0, 0.5);
        let result = p.compose(&p.inverse());
        assert_relative_eq!(result.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_matches_point_chaining() {
        let a = Pose2D::new(1.0, -2.0, 0.7);
        let b = Pose2D::new(-0.5, 3.0, -1.9);
        let p = Point2D::new(0.3, 0.8);

        let chained = a.transform_point(&b.transform_point(&p));
        let composed = a.compose(&b).transform_point(&p);
        assert_relative_eq!(chained.x, composed.x, epsilon = 1e-12);
        assert_relative_eq!(chained.y, composed.y, epsilon = 1e-12);
    }

    #[test]
    fn test_between_recovers_relative_pose() {
        let a = Pose2D::new(2.0, 1.0, FRAC_PI_2);
        let rel = Pose2D::new(1.0, 0.5, -FRAC_PI_4);
        let b = a.compose(&rel);
        let recovered = a.between(&b);
        assert_relative_eq!(recovered.x, rel.x, epsilon = 1e-12);
        assert_relative_eq!(recovered.y, rel.y, epsilon = 1e-12);
        assert_relative_eq!(recovered.theta, rel.theta, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_point() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let result = pose.transform_point(&Point2D::new(1.0, 0.0));
        assert_relative_eq!(result.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 1.0, epsilon = 1e-12);

        let local = pose.inverse_transform_point(&result);
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_roundtrip() {
        let pose = Pose2D::new(0.5, -0.25, -2.3);
        let back = Pose2D::from_rotation_translation(&pose.rotation_matrix(), &pose.translation());
        assert_relative_eq!(back.theta, pose.theta, epsilon = 1e-12);
        assert_relative_eq!(back.x, 0.5);
        assert_relative_eq!(back.y, -0.25);
    }

    #[test]
    fn test_new_wraps_theta() {
        let pose = Pose2D::new(0.0, 0.0, 3.0 * FRAC_PI_2);
        assert_relative_eq!(pose.theta, -FRAC_PI_2, epsilon = 1e-12);
    }
}
