//! Point-to-Point Iterative Closest Point (ICP) algorithm.
//!
//! # Algorithm
//!
//! ```text
//! Input: Source cloud A, target cloud B, initial guess T₀
//! Output: Transform T* that maps A onto B
//!
//! 1. T = T₀
//! 2. For each iteration:
//!    a. Pair each point of T(A) with a point of B
//!    b. Closed-form rigid fit ΔT of the pairs (Kabsch)
//!    c. T = ΔT ⊕ T
//!    d. e = mean distance between T(aᵢ) and its partner
//!    e. Stop once |e - e_prev| < tolerance
//! 3. Return T, e
//! ```
//!
//! Nearest-neighbor pairing only finds the basin around its seed. When the
//! seeded run ends with a large residual, a coarse search restarts from
//! centroid-aligned rotations around the full circle and keeps the best.

use super::correspondence::{NearestNeighborIndex, Pair, feature_id_pairs};
use super::procrustes;
use super::{Correspondences, Registration};
use crate::config::IcpConfig;
use crate::core::types::{Point2D, PointCloud2D, Pose2D};
use crate::error::{Result, SlamError};

/// Finest coarse rotation spacing honored (degrees).
const MIN_COARSE_STEP_DEG: f64 = 1.0;

/// How pairs are produced on each iteration.
enum Pairing {
    /// Computed once, reused every iteration.
    Fixed(Vec<Pair>),
    /// Recomputed from the current estimate every iteration.
    Nearest(NearestNeighborIndex),
}

impl Pairing {
    fn pairs(&self, source: &PointCloud2D, transform: &Pose2D) -> Vec<Pair> {
        match self {
            Pairing::Fixed(pairs) => pairs.clone(),
            Pairing::Nearest(index) => index.pairs(source, transform),
        }
    }
}

/// Point-to-point ICP.
///
/// Stateless between calls: any spatial index is built from the target
/// cloud at the start of a call and dropped at the end.
#[derive(Debug, Clone, Default)]
pub struct Icp {
    config: IcpConfig,
}

impl Icp {
    /// Create a new ICP matcher with the given configuration.
    pub fn new(config: IcpConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &IcpConfig {
        &self.config
    }

    /// Align `source` to `target` starting from the identity.
    pub fn find_transform(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        correspondences: Correspondences<'_>,
    ) -> Result<Registration> {
        self.find_transform_from(source, target, correspondences, &Pose2D::identity())
    }

    /// Align `source` to `target` starting from `initial_guess`.
    pub fn find_transform_from(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        correspondences: Correspondences<'_>,
        initial_guess: &Pose2D,
    ) -> Result<Registration> {
        if source.is_empty() || target.is_empty() {
            return Err(SlamError::DegenerateInput {
                correspondences: 0,
                reason: "empty point set",
            });
        }

        match correspondences {
            Correspondences::Explicit(indices) => {
                let pairs = indices
                    .iter()
                    .take(source.len())
                    .enumerate()
                    .filter(|&(_, &j)| j < target.len())
                    .map(|(i, &j)| (i, j))
                    .collect();
                self.iterate(source, target, &Pairing::Fixed(pairs), initial_guess)
            }
            Correspondences::FeatureId => {
                let pairs = feature_id_pairs(
                    source,
                    target,
                    self.config.id_correspondence_max_distance,
                );
                self.iterate(source, target, &Pairing::Fixed(pairs), initial_guess)
            }
            Correspondences::NearestNeighbor => {
                let pairing = Pairing::Nearest(NearestNeighborIndex::build(target));
                let seeded = self.iterate(source, target, &pairing, initial_guess)?;
                if seeded.residual <= self.config.coarse_search_trigger_residual
                    || self.config.coarse_rotation_step_deg <= 0.0
                {
                    return Ok(seeded);
                }
                Ok(self.coarse_search(source, target, &pairing, seeded))
            }
        }
    }

    /// Restart from rotations spaced `coarse_rotation_step_deg` apart, each
    /// with the source centroid placed on the target centroid, and keep the
    /// lowest residual. `best` wins ties.
    fn coarse_search(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        pairing: &Pairing,
        mut best: Registration,
    ) -> Registration {
        let (Some(source_centroid), Some(target_centroid)) = (source.centroid(), target.centroid())
        else {
            return best;
        };

        let step = self.config.coarse_rotation_step_deg.max(MIN_COARSE_STEP_DEG);
        let seeds = (360.0 / step).round().max(1.0) as usize;
        log::debug!(
            "ICP residual {:.4} above {:.4}, trying {} coarse rotation seeds",
            best.residual,
            self.config.coarse_search_trigger_residual,
            seeds
        );

        for k in 0..seeds {
            let angle = (k as f64 * step).to_radians();
            let rotated = Pose2D::new(0.0, 0.0, angle).transform_point(&source_centroid);
            let seed = Pose2D::new(
                target_centroid.x - rotated.x,
                target_centroid.y - rotated.y,
                angle,
            );

            match self.iterate(source, target, pairing, &seed) {
                Ok(candidate) if candidate.residual < best.residual => best = candidate,
                Ok(_) => {}
                Err(e) => log::debug!("Coarse seed {:.1}° skipped: {}", angle.to_degrees(), e),
            }
        }

        best
    }

    fn iterate(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        pairing: &Pairing,
        initial_guess: &Pose2D,
    ) -> Result<Registration> {
        let mut transform = *initial_guess;
        let mut previous_error: Option<f64> = None;
        let mut result = Registration {
            transform,
            residual: f64::INFINITY,
            iterations: 0,
            correspondences: 0,
            converged: false,
        };

        for iteration in 1..=self.config.max_icp_iterations {
            let pairs = pairing.pairs(source, &transform);
            let matched = matched_points(source, target, &pairs, &transform);

            let step = procrustes::align(&matched)?;
            transform = step.compose(&transform);

            let error = mean_error(source, target, &pairs, &transform);
            result = Registration {
                transform,
                residual: error,
                iterations: iteration,
                correspondences: pairs.len(),
                converged: false,
            };

            if let Some(previous) = previous_error
                && (previous - error).abs() < self.config.icp_tolerance
            {
                result.converged = true;
                break;
            }
            previous_error = Some(error);
        }

        log::debug!(
            "ICP finished: {} iterations, {} correspondences, residual {:.6}, converged {}",
            result.iterations,
            result.correspondences,
            result.residual,
            result.converged
        );
        Ok(result)
    }
}

/// Source points mapped through `transform`, paired with their targets.
fn matched_points(
    source: &PointCloud2D,
    target: &PointCloud2D,
    pairs: &[Pair],
    transform: &Pose2D,
) -> Vec<(Point2D, Point2D)> {
    pairs
        .iter()
        .filter_map(|&(i, j)| {
            let a = source.get(i)?.position();
            let b = target.get(j)?.position();
            Some((transform.transform_point(&a), b))
        })
        .collect()
}

/// Mean Euclidean distance between transformed source points and targets.
fn mean_error(source: &PointCloud2D, target: &PointCloud2D, pairs: &[Pair], transform: &Pose2D) -> f64 {
    let matched = matched_points(source, target, pairs, transform);
    if matched.is_empty() {
        return f64::INFINITY;
    }
    let total: f64 = matched.iter().map(|(a, b)| a.distance(b)).sum();
    total / matched.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    /// Asymmetric L: 20 points along x, 9 along y, 0.5 apart.
    fn create_l_shape() -> PointCloud2D {
        let mut cloud = PointCloud2D::with_capacity(29);
        for i in 0..20 {
            cloud.push_xy(i as f64 * 0.5, 0.0);
        }
        for i in 1..10 {
            cloud.push_xy(0.0, i as f64 * 0.5);
        }
        cloud
    }

    fn tagged_l_shape() -> PointCloud2D {
        create_l_shape()
            .iter()
            .enumerate()
            .map(|(i, p)| crate::core::types::ScanPoint::tagged(p.x, p.y, 100 + i as u64))
            .collect()
    }

    fn identity_indices(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    fn recovery_angles() -> [f64; 5] {
        [-90.0, -45.0, 0.0, 45.0, 90.0]
    }

    #[test]
    fn test_self_alignment() {
        let cloud = create_l_shape();
        let icp = Icp::default();

        for mode in [Correspondences::NearestNeighbor, Correspondences::FeatureId] {
            let cloud = if mode == Correspondences::FeatureId {
                tagged_l_shape()
            } else {
                cloud.clone()
            };
            let result = icp.find_transform(&cloud, &cloud, mode).unwrap();
            assert_relative_eq!(result.transform.x, 0.0, epsilon = 1e-9);
            assert_relative_eq!(result.transform.y, 0.0, epsilon = 1e-9);
            assert_relative_eq!(result.transform.theta, 0.0, epsilon = 1e-9);
            assert!(result.residual < 1e-9);
            assert_relative_eq!(result.rotation_matrix()[(0, 0)], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_recovery_explicit_correspondences() {
        let source = create_l_shape();
        let indices = identity_indices(source.len());
        let icp = Icp::default();

        for deg in recovery_angles() {
            let truth = Pose2D::new(2.0, 2.0, deg.to_radians());
            let target = source.transform(&truth);
            let result = icp
                .find_transform(&source, &target, Correspondences::Explicit(&indices))
                .unwrap();

            assert_relative_eq!(result.transform.theta, truth.theta, epsilon = 1e-6);
            assert_relative_eq!(result.translation().x, 2.0, epsilon = 1e-6);
            assert_relative_eq!(result.translation().y, 2.0, epsilon = 1e-6);
            assert!(result.converged);
            assert_eq!(result.correspondences, source.len());
        }
    }

    #[test]
    fn test_recovery_nearest_neighbor() {
        let source = create_l_shape();
        let icp = Icp::default();

        for deg in recovery_angles() {
            let truth = Pose2D::new(2.0, 2.0, deg.to_radians());
            let target = source.transform(&truth);
            let result = icp
                .find_transform(&source, &target, Correspondences::NearestNeighbor)
                .unwrap();

            assert_relative_eq!(result.transform.theta, truth.theta, epsilon = 1e-3);
            assert_relative_eq!(result.transform.x, 2.0, epsilon = 1e-3);
            assert_relative_eq!(result.transform.y, 2.0, epsilon = 1e-3);
            assert!(result.residual < 1e-6, "{deg}°: residual {}", result.residual);
        }
    }

    #[test]
    fn test_recovery_feature_ids() {
        let source = tagged_l_shape();
        let icp = Icp::default();

        let truth = Pose2D::new(2.0, 2.0, -FRAC_PI_4);
        let target = source.transform(&truth);
        let result = icp
            .find_transform(&source, &target, Correspondences::FeatureId)
            .unwrap();

        assert_relative_eq!(result.transform.theta, truth.theta, epsilon = 1e-6);
        assert_relative_eq!(result.transform.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.transform.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_initial_guess_is_used() {
        let source = create_l_shape();
        let truth = Pose2D::new(0.4, -0.3, 0.1);
        let target = source.transform(&truth);
        let icp = Icp::new(IcpConfig {
            coarse_rotation_step_deg: 0.0,
            ..IcpConfig::default()
        });

        let result = icp
            .find_transform_from(&source, &target, Correspondences::NearestNeighbor, &truth)
            .unwrap();
        assert!(result.residual < 1e-9);
        assert!(result.iterations <= 3);
    }

    #[test]
    fn test_residual_separation() {
        let source = create_l_shape();
        let icp = Icp::default();

        let aligned = icp
            .find_transform(&source, &source, Correspondences::Explicit(&identity_indices(source.len())))
            .unwrap();
        assert!(aligned.residual < 1e-9);

        // Reversed pairing cannot be explained by a rigid motion
        let reversed: Vec<usize> = (0..source.len()).rev().collect();
        let scrambled = icp
            .find_transform(&source, &source, Correspondences::Explicit(&reversed))
            .unwrap();
        assert!(scrambled.residual > 0.5, "residual {}", scrambled.residual);
    }

    #[test]
    fn test_outliers_raise_residual() {
        let source = create_l_shape();
        let mut target = source.transform(&Pose2D::new(1.0, 0.0, 0.0));
        let mut noisy = PointCloud2D::new();
        for (i, p) in target.iter().enumerate() {
            if i % 4 == 0 {
                noisy.push_xy(p.x + 3.0, p.y - 2.0);
            } else {
                noisy.push(*p);
            }
        }
        target = noisy;

        let indices = identity_indices(source.len());
        let result = Icp::default()
            .find_transform(&source, &target, Correspondences::Explicit(&indices))
            .unwrap();
        assert!(result.residual > 0.5, "residual {}", result.residual);
    }

    #[test]
    fn test_explicit_skips_out_of_range_indices() {
        let source = create_l_shape();
        let target = source.transform(&Pose2D::new(0.5, 0.5, 0.2));
        let mut indices = identity_indices(source.len());
        indices[3] = 10_000;
        indices[7] = usize::MAX;

        let result = Icp::default()
            .find_transform(&source, &target, Correspondences::Explicit(&indices))
            .unwrap();
        assert_eq!(result.correspondences, source.len() - 2);
        assert_relative_eq!(result.transform.theta, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_too_few_correspondences_is_degenerate() {
        let source = create_l_shape();
        let indices = [0usize];
        let err = Icp::default()
            .find_transform(&source, &source, Correspondences::Explicit(&indices))
            .unwrap_err();
        assert!(matches!(
            err,
            SlamError::DegenerateInput {
                correspondences: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_cloud_is_degenerate() {
        let err = Icp::default()
            .find_transform(&PointCloud2D::new(), &create_l_shape(), Correspondences::NearestNeighbor)
            .unwrap_err();
        assert!(matches!(err, SlamError::DegenerateInput { .. }));
    }

    #[test]
    fn test_feature_ids_on_untagged_clouds_is_degenerate() {
        let cloud = create_l_shape();
        let err = Icp::default()
            .find_transform(&cloud, &cloud, Correspondences::FeatureId)
            .unwrap_err();
        assert!(matches!(
            err,
            SlamError::DegenerateInput {
                correspondences: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_collinear_wall_is_degenerate() {
        let wall: PointCloud2D = (0..20)
            .map(|i| crate::core::types::ScanPoint::tagged(i as f64 * 0.5, 2.0, i as u64))
            .collect();
        let target = wall.transform(&Pose2D::new(-3.0, 0.0, 0.0));
        let icp = Icp::default();

        let indices = identity_indices(wall.len());
        for mode in [
            Correspondences::Explicit(&indices),
            Correspondences::NearestNeighbor,
            Correspondences::FeatureId,
        ] {
            let err = icp.find_transform(&wall, &target, mode).unwrap_err();
            assert_eq!(
                err,
                SlamError::DegenerateInput {
                    correspondences: 20,
                    reason: "collinear correspondences",
                },
                "{mode:?}"
            );
        }
    }

    #[test]
    fn test_tiny_coarse_step_is_floored() {
        let source = create_l_shape();
        let target = source.transform(&Pose2D::new(0.5, -0.3, 2.5));
        let icp = Icp::new(IcpConfig {
            coarse_rotation_step_deg: 1e-9,
            ..IcpConfig::default()
        });
        let result = icp
            .find_transform(&source, &target, Correspondences::NearestNeighbor)
            .unwrap();
        assert!(result.residual < 1e-6, "residual {}", result.residual);
    }

    #[test]
    fn test_iteration_cap() {
        let source = create_l_shape();
        let target = source.transform(&Pose2D::new(3.0, 1.0, 0.6));
        let icp = Icp::new(IcpConfig {
            max_icp_iterations: 1,
            coarse_rotation_step_deg: 0.0,
            ..IcpConfig::default()
        });
        let result = icp
            .find_transform(&source, &target, Correspondences::NearestNeighbor)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
    }
}
