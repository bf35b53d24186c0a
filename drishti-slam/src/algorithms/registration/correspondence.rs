//! Correspondence search between a source and a target point cloud.
//!
//! Two strategies:
//! - [`NearestNeighborIndex`]: Euclidean nearest neighbor through a k-d tree
//!   built from the target cloud. The index lives for one registration call.
//! - [`feature_id_pairs`]: nearest neighbor in feature-id space with a
//!   distance gate and first-come-first-served claims on target points.

use std::collections::{BTreeMap, HashSet};

use kiddo::{KdTree, SquaredEuclidean};

use crate::core::types::{PointCloud2D, Pose2D};

/// Source/target index pair.
pub type Pair = (usize, usize);

/// k-d tree over the positions of a target cloud.
pub struct NearestNeighborIndex {
    tree: KdTree<f64, 2>,
    len: usize,
}

impl NearestNeighborIndex {
    /// Build a k-d tree from a point cloud.
    pub fn build(target: &PointCloud2D) -> Self {
        let mut tree: KdTree<f64, 2> = KdTree::new();
        for (i, point) in target.iter().enumerate() {
            tree.add(&[point.x, point.y], i as u64);
        }
        Self {
            tree,
            len: target.len(),
        }
    }

    /// Pair every source point, mapped through `transform`, with its
    /// nearest target point.
    pub fn pairs(&self, source: &PointCloud2D, transform: &Pose2D) -> Vec<Pair> {
        if self.len == 0 {
            return Vec::new();
        }

        let (sin_t, cos_t) = transform.theta.sin_cos();
        source
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let tx = transform.x + p.x * cos_t - p.y * sin_t;
                let ty = transform.y + p.x * sin_t + p.y * cos_t;
                let nearest = self.tree.nearest_one::<SquaredEuclidean>(&[tx, ty]);
                (i, nearest.item as usize)
            })
            .collect()
    }
}

/// Match source points to target points by feature id.
///
/// Each tagged source point, in order, looks up the target point whose id
/// is closest to its own. The match is kept when the id distance is within
/// `max_distance` and no earlier source point has claimed that target.
/// Untagged points on either side never match. When several target points
/// share an id, the first one stands for that id.
pub fn feature_id_pairs(source: &PointCloud2D, target: &PointCloud2D, max_distance: f64) -> Vec<Pair> {
    let mut by_id: BTreeMap<u64, usize> = BTreeMap::new();
    for (j, point) in target.iter().enumerate() {
        if let Some(id) = point.feature_id {
            by_id.entry(id).or_insert(j);
        }
    }
    if by_id.is_empty() {
        return Vec::new();
    }

    let mut claimed: HashSet<usize> = HashSet::new();
    let mut pairs = Vec::new();

    for (i, point) in source.iter().enumerate() {
        let Some(id) = point.feature_id else {
            continue;
        };

        let below = by_id.range(..=id).next_back();
        let above = by_id.range(id..).next();
        let nearest = match (below, above) {
            (Some((&lo, &jl)), Some((&hi, &jh))) => {
                if id - lo <= hi - id {
                    (id - lo, jl)
                } else {
                    (hi - id, jh)
                }
            }
            (Some((&lo, &jl)), None) => (id - lo, jl),
            (None, Some((&hi, &jh))) => (hi - id, jh),
            (None, None) => continue,
        };

        let (distance, j) = nearest;
        if distance as f64 > max_distance {
            continue;
        }
        if claimed.insert(j) {
            pairs.push((i, j));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Point2D, ScanPoint};

    fn tagged(ids: &[Option<u64>]) -> PointCloud2D {
        ids.iter()
            .enumerate()
            .map(|(i, id)| ScanPoint {
                x: i as f64,
                y: 0.0,
                feature_id: *id,
            })
            .collect()
    }

    #[test]
    fn test_nearest_neighbor_pairs() {
        let target = PointCloud2D::from_points([
            Point2D::new(0.0, 0.0),
            Point2D::new(5.0, 0.0),
        ]);
        let source = PointCloud2D::from_points([
            Point2D::new(4.0, 0.5),
            Point2D::new(0.5, -0.5),
        ]);

        let index = NearestNeighborIndex::build(&target);
        assert_eq!(index.pairs(&source, &Pose2D::identity()), vec![(0, 1), (1, 0)]);

        // Shifting the source far left sends both points to the first target
        let shifted = index.pairs(&source, &Pose2D::new(-10.0, 0.0, 0.0));
        assert_eq!(shifted, vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_nearest_neighbor_empty_target() {
        let index = NearestNeighborIndex::build(&PointCloud2D::new());
        let source = tagged(&[None, None]);
        assert!(index.pairs(&source, &Pose2D::identity()).is_empty());
    }

    #[test]
    fn test_feature_id_exact_matches() {
        let source = tagged(&[Some(3), Some(1), Some(2)]);
        let target = tagged(&[Some(1), Some(2), Some(3)]);
        let pairs = feature_id_pairs(&source, &target, 0.5);
        assert_eq!(pairs, vec![(0, 2), (1, 0), (2, 1)]);
    }

    #[test]
    fn test_feature_id_gate() {
        let source = tagged(&[Some(10), Some(20)]);
        let target = tagged(&[Some(11), Some(25)]);

        assert!(feature_id_pairs(&source, &target, 0.5).is_empty());
        assert_eq!(feature_id_pairs(&source, &target, 1.0), vec![(0, 0)]);
        assert_eq!(feature_id_pairs(&source, &target, 5.0), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_feature_id_first_claim_wins() {
        // Both source points are nearest to target id 5
        let source = tagged(&[Some(5), Some(6)]);
        let target = tagged(&[Some(5), Some(9)]);
        let pairs = feature_id_pairs(&source, &target, 2.0);
        assert_eq!(pairs, vec![(0, 0)]);
    }

    #[test]
    fn test_feature_id_skips_untagged() {
        let source = tagged(&[None, Some(1), None]);
        let target = tagged(&[Some(1), None]);
        assert_eq!(feature_id_pairs(&source, &target, 0.5), vec![(1, 0)]);

        let untagged_target = tagged(&[None, None]);
        assert!(feature_id_pairs(&source, &untagged_target, 10.0).is_empty());
    }

    #[test]
    fn test_feature_id_tie_prefers_lower_id() {
        let source = tagged(&[Some(5)]);
        let target = tagged(&[Some(7), Some(3)]);
        assert_eq!(feature_id_pairs(&source, &target, 2.0), vec![(0, 1)]);
    }
}
