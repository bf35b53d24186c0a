//! Scan point clouds and the front-end input record.

use serde::{Deserialize, Serialize};

use super::pose::{Point2D, Pose2D};

/// One observed point, optionally tagged with a feature id.
///
/// The id is whatever the sensor model reports as the identity of the
/// observed landmark or obstacle cell. Feature-id correspondence matches
/// points by the distance between these ids rather than by position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanPoint {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Feature identifier, `None` for untagged returns
    pub feature_id: Option<u64>,
}

impl ScanPoint {
    /// Untagged point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            feature_id: None,
        }
    }

    /// Point carrying a feature id.
    #[inline]
    pub fn tagged(x: f64, y: f64, feature_id: u64) -> Self {
        Self {
            x,
            y,
            feature_id: Some(feature_id),
        }
    }

    /// Position only.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Ordered collection of 2D scan points in a single coordinate frame.
///
/// Used as the observed cloud of a keyframe (robot-local frame) and as the
/// input/output of registration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud2D {
    points: Vec<ScanPoint>,
}

impl PointCloud2D {
    /// Create an empty point cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create from untagged positions.
    pub fn from_points(points: impl IntoIterator<Item = Point2D>) -> Self {
        Self {
            points: points
                .into_iter()
                .map(|p| ScanPoint::new(p.x, p.y))
                .collect(),
        }
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, point: ScanPoint) {
        self.points.push(point);
    }

    /// Append an untagged point by coordinates.
    #[inline]
    pub fn push_xy(&mut self, x: f64, y: f64) {
        self.points.push(ScanPoint::new(x, y));
    }

    /// Append a point carrying a feature id.
    #[inline]
    pub fn push_tagged(&mut self, x: f64, y: f64, feature_id: u64) {
        self.points.push(ScanPoint::tagged(x, y, feature_id));
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at index, `None` when out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ScanPoint> {
        self.points.get(index)
    }

    /// All points as a slice.
    #[inline]
    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    /// Iterate over points.
    pub fn iter(&self) -> impl Iterator<Item = &ScanPoint> + '_ {
        self.points.iter()
    }

    /// Iterate over positions only.
    pub fn positions(&self) -> impl Iterator<Item = Point2D> + '_ {
        self.points.iter().map(ScanPoint::position)
    }

    /// True when at least one point carries a feature id.
    pub fn has_feature_ids(&self) -> bool {
        self.points.iter().any(|p| p.feature_id.is_some())
    }

    /// Centroid of all points, `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point2D> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2D::new(sx / n, sy / n))
    }

    /// Copy of the cloud with every point mapped through `pose`.
    ///
    /// Feature ids are carried over unchanged.
    pub fn transform(&self, pose: &Pose2D) -> PointCloud2D {
        let (sin_t, cos_t) = pose.theta.sin_cos();
        let points = self
            .points
            .iter()
            .map(|p| ScanPoint {
                x: pose.x + p.x * cos_t - p.y * sin_t,
                y: pose.y + p.x * sin_t + p.y * cos_t,
                feature_id: p.feature_id,
            })
            .collect();
        PointCloud2D { points }
    }

    /// Append all points of another cloud.
    pub fn extend(&mut self, other: &PointCloud2D) {
        self.points.extend_from_slice(&other.points);
    }
}

impl FromIterator<ScanPoint> for PointCloud2D {
    fn from_iter<I: IntoIterator<Item = ScanPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ScanPoint>> for PointCloud2D {
    fn from(points: Vec<ScanPoint>) -> Self {
        Self { points }
    }
}

/// One front-end input: the odometry pose at capture time and the scan
/// observed from it, in the robot's local frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    /// Raw odometry pose
    pub odometry: Pose2D,
    /// Local-frame scan
    pub points: PointCloud2D,
}

impl Measurement {
    pub fn new(odometry: Pose2D, points: PointCloud2D) -> Self {
        Self { odometry, points }
    }
}
