//! Keyframes produced by the front end.

use crate::core::types::{PointCloud2D, Pose2D};

/// A keyframe: a scan stamped with its global pose.
///
/// The relative transform to the reference keyframe is fixed when the frame
/// is created. Only [`Frame::pose`] is rewritten by the back end.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Global pose of the robot when this frame was captured.
    pub pose: Pose2D,

    odometry: Pose2D,

    /// Point cloud in robot-local frame.
    points: PointCloud2D,

    /// Index of the keyframe this one was aligned against.
    reference: usize,

    /// ICP transform mapping this frame's points into the reference frame.
    relative: Pose2D,

    residual: f64,
}

impl Frame {
    pub(crate) fn new(
        pose: Pose2D,
        odometry: Pose2D,
        points: PointCloud2D,
        reference: usize,
        relative: Pose2D,
        residual: f64,
    ) -> Self {
        Self {
            pose,
            odometry,
            points,
            reference,
            relative,
            residual,
        }
    }

    /// First keyframe of a trajectory: placed at its odometry pose.
    pub(crate) fn origin(odometry: Pose2D, points: PointCloud2D) -> Self {
        Self::new(odometry, odometry, points, 0, Pose2D::identity(), 0.0)
    }

    /// Raw odometry pose at capture.
    pub fn odometry(&self) -> &Pose2D {
        &self.odometry
    }

    /// Observed points in robot-local frame.
    pub fn points(&self) -> &PointCloud2D {
        &self.points
    }

    /// Index of the keyframe [`Frame::relative_transform`] is measured
    /// from. Zero for the first keyframe and for loop frames.
    pub fn reference_index(&self) -> usize {
        self.reference
    }

    /// Pose of this frame in its reference keyframe's coordinates, as
    /// estimated by ICP when the frame was created.
    ///
    /// Identity for the first keyframe.
    pub fn relative_transform(&self) -> Pose2D {
        self.relative
    }

    /// ICP residual of the alignment that produced this frame.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Transform the scan to global frame.
    pub fn global_points(&self) -> PointCloud2D {
        self.points.transform(&self.pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_origin_frame() {
        let mut points = PointCloud2D::new();
        points.push_xy(1.0, 0.0);
        let odometry = Pose2D::new(3.0, -1.0, 0.5);

        let frame = Frame::origin(odometry, points);
        assert_eq!(frame.pose, odometry);
        assert_eq!(frame.relative_transform(), Pose2D::identity());
        assert_eq!(frame.residual(), 0.0);
        assert_eq!(frame.reference_index(), 0);
    }

    #[test]
    fn test_global_points_follow_pose() {
        let mut points = PointCloud2D::new();
        points.push_tagged(1.0, 0.0, 4);
        let mut frame = Frame::new(
            Pose2D::identity(),
            Pose2D::identity(),
            points,
            3,
            Pose2D::new(0.5, 0.0, 0.0),
            0.01,
        );

        frame.pose = Pose2D::new(1.0, 1.0, FRAC_PI_2);
        let global = frame.global_points();
        let p = global.get(0).unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
        assert_eq!(p.feature_id, Some(4));

        // Rewriting the pose leaves the creation-time measurement alone
        assert_eq!(frame.relative_transform(), Pose2D::new(0.5, 0.0, 0.0));
        assert_eq!(frame.reference_index(), 3);
        assert_eq!(frame.points().len(), 1);
    }
}
