//! Point cloud registration.
//!
//! Aligns two 2D point sets and reports the rigid transform between them.
//!
//! - [`Icp`]: Point-to-point Iterative Closest Point with closed-form
//!   (Kabsch) updates
//! - [`Correspondences`]: How source points are paired with target points
//!
//! # Example
//!
//! ```
//! use drishti_slam::algorithms::registration::{Correspondences, Icp};
//! use drishti_slam::config::IcpConfig;
//! use drishti_slam::core::types::{PointCloud2D, Pose2D};
//!
//! let mut source = PointCloud2D::new();
//! for i in 0..10 {
//!     source.push_xy(i as f64 * 0.5, 0.0);
//!     source.push_xy(0.0, 0.5 + i as f64 * 0.25);
//! }
//! let target = source.transform(&Pose2D::new(1.0, 2.0, 0.3));
//!
//! let icp = Icp::new(IcpConfig::default());
//! let indices: Vec<usize> = (0..source.len()).collect();
//! let result = icp
//!     .find_transform(&source, &target, Correspondences::Explicit(&indices))
//!     .unwrap();
//!
//! assert!((result.transform.theta - 0.3).abs() < 1e-6);
//! assert!(result.residual < 1e-6);
//! ```

mod correspondence;
mod icp;
mod procrustes;

pub use correspondence::{NearestNeighborIndex, Pair, feature_id_pairs};
pub use icp::Icp;

use nalgebra::{Matrix2, Vector2};

use crate::core::types::Pose2D;

/// How registration pairs source points with target points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correspondences<'a> {
    /// `indices[i]` is the target index for source point `i`. Indices past
    /// the end of the target cloud are skipped.
    Explicit(&'a [usize]),
    /// Euclidean nearest neighbor, recomputed every iteration.
    NearestNeighbor,
    /// Nearest neighbor in feature-id space, computed once per call.
    FeatureId,
}

/// Result of a registration call.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Rigid transform mapping source points into the target frame.
    pub transform: Pose2D,

    /// Mean Euclidean distance between transformed source points and their
    /// matched target points.
    pub residual: f64,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Number of correspondences used in the final iteration.
    pub correspondences: usize,

    /// Whether the error-change tolerance was reached before the
    /// iteration cap.
    pub converged: bool,
}

impl Registration {
    /// 2x2 rotation matrix of the transform.
    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        self.transform.rotation_matrix()
    }

    /// Translation of the transform.
    pub fn translation(&self) -> Vector2<f64> {
        self.transform.translation()
    }
}
