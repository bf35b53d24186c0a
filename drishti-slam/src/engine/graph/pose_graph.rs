//! Pose graph data structure for the SLAM back end.
//!
//! A pose graph represents the robot trajectory as a graph where:
//! - Vertices are keyframe poses, keyed by caller-chosen ids
//! - Edges are relative pose constraints between vertices
//!
//! One vertex (`prior_vertex_id`) is anchored by a prior factor at the pose
//! it was inserted with, which removes the gauge freedom of the graph.

use std::collections::HashMap;

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use super::optimizer::{GaussNewton, OptimizationSummary};
use crate::config::{OptimizerConfig, PoseGraphConfig};
use crate::core::types::Pose2D;
use crate::error::{Result, SlamError};

/// Information matrix (inverse covariance) for 2D pose.
///
/// Stored as the upper triangle of a 3x3 symmetric matrix:
/// ```text
/// | xx  xy  xt |
/// | xy  yy  yt |
/// | xt  yt  tt |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Information2D {
    /// Information for x-x
    pub xx: f64,
    /// Information for x-y
    pub xy: f64,
    /// Information for x-theta
    pub xt: f64,
    /// Information for y-y
    pub yy: f64,
    /// Information for y-theta
    pub yt: f64,
    /// Information for theta-theta
    pub tt: f64,
}

impl Information2D {
    /// Create a diagonal information matrix.
    pub fn diagonal(xx: f64, yy: f64, tt: f64) -> Self {
        Self {
            xx,
            xy: 0.0,
            xt: 0.0,
            yy,
            yt: 0.0,
            tt,
        }
    }

    /// Create from standard deviations.
    pub fn from_std_dev(sigma_x: f64, sigma_y: f64, sigma_t: f64) -> Self {
        Self::diagonal(
            1.0 / (sigma_x * sigma_x),
            1.0 / (sigma_y * sigma_y),
            1.0 / (sigma_t * sigma_t),
        )
    }

    /// Full symmetric 3x3 matrix.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.xx, self.xy, self.xt, //
            self.xy, self.yy, self.yt, //
            self.xt, self.yt, self.tt,
        )
    }
}

/// Type of edge in the pose graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Constraint between consecutive keyframes.
    Sequential,
    /// Constraint closing a loop back to an earlier keyframe.
    LoopClosure,
}

/// An edge in the pose graph representing a constraint between poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEdge {
    /// Source vertex id.
    pub from: u64,

    /// Target vertex id.
    pub to: u64,

    /// Relative pose measurement: X_from⁻¹ ⊕ X_to
    pub measurement: Pose2D,

    /// Information matrix (inverse covariance).
    pub information: Information2D,

    pub kind: EdgeKind,
}

/// Prior factor holding one vertex near its inserted pose.
#[derive(Debug, Clone, Copy)]
pub(super) struct Prior {
    /// Position of the anchored vertex in the vertex list.
    pub index: usize,
    pub anchor: Pose2D,
    pub information: Information2D,
}

/// Pose graph for SLAM optimization.
#[derive(Debug, Clone)]
pub struct PoseGraph {
    config: PoseGraphConfig,
    optimizer: OptimizerConfig,

    /// Vertex ids in insertion order; index i owns `poses[i]`.
    ids: Vec<u64>,
    poses: Vec<Pose2D>,
    index: HashMap<u64, usize>,

    edges: Vec<PoseEdge>,
    prior: Option<Prior>,

    /// Set by a completed `optimize()`, cleared by any structural change.
    optimized: bool,
}

impl Default for PoseGraph {
    fn default() -> Self {
        Self::new(PoseGraphConfig::default(), OptimizerConfig::default())
    }
}

impl PoseGraph {
    /// Create a new empty pose graph.
    pub fn new(config: PoseGraphConfig, optimizer: OptimizerConfig) -> Self {
        Self {
            config,
            optimizer,
            ids: Vec::new(),
            poses: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            prior: None,
            optimized: false,
        }
    }

    pub fn config(&self) -> &PoseGraphConfig {
        &self.config
    }

    /// Add a vertex with its initial pose estimate.
    ///
    /// Inserting `prior_vertex_id` also anchors the prior factor at this
    /// pose.
    pub fn add_vertex(&mut self, id: u64, tx: f64, ty: f64, theta: f64) -> Result<()> {
        if self.index.contains_key(&id) {
            return Err(SlamError::DuplicateVertex(id));
        }

        let pose = Pose2D::new(tx, ty, theta);
        let position = self.poses.len();
        self.ids.push(id);
        self.poses.push(pose);
        self.index.insert(id, position);

        if id == self.config.prior_vertex_id {
            self.prior = Some(Prior {
                index: position,
                anchor: pose,
                information: Information2D::from_std_dev(
                    self.config.prior_sigma_x,
                    self.config.prior_sigma_y,
                    self.config.prior_sigma_theta,
                ),
            });
        }

        self.optimized = false;
        Ok(())
    }

    /// Add a sequential constraint `X_i⁻¹ ⊕ X_j ≈ (tx, ty, theta)`.
    ///
    /// Without an explicit `information`, the diagonal default built from
    /// the configured edge sigmas is used.
    pub fn add_factor_edge(
        &mut self,
        i: u64,
        j: u64,
        tx: f64,
        ty: f64,
        theta: f64,
        information: Option<Information2D>,
    ) -> Result<()> {
        self.push_edge(i, j, Pose2D::new(tx, ty, theta), information, EdgeKind::Sequential)
    }

    /// Add a loop-closure constraint. Same contract as
    /// [`PoseGraph::add_factor_edge`].
    pub fn add_loop_closure_edge(
        &mut self,
        i: u64,
        j: u64,
        tx: f64,
        ty: f64,
        theta: f64,
        information: Option<Information2D>,
    ) -> Result<()> {
        self.push_edge(i, j, Pose2D::new(tx, ty, theta), information, EdgeKind::LoopClosure)
    }

    fn push_edge(
        &mut self,
        from: u64,
        to: u64,
        measurement: Pose2D,
        information: Option<Information2D>,
        kind: EdgeKind,
    ) -> Result<()> {
        for id in [from, to] {
            if !self.index.contains_key(&id) {
                return Err(SlamError::UnknownVertex(id));
            }
        }

        let information = information.unwrap_or_else(|| {
            Information2D::from_std_dev(
                self.config.edge_sigma_x,
                self.config.edge_sigma_y,
                self.config.edge_sigma_angle,
            )
        });

        self.edges.push(PoseEdge {
            from,
            to,
            measurement,
            information,
            kind,
        });
        self.optimized = false;
        Ok(())
    }

    /// Run Gauss-Newton over all vertices.
    pub fn optimize(&mut self) -> Result<OptimizationSummary> {
        let summary = GaussNewton::new(self.optimizer.clone()).optimize(self)?;
        self.optimized = true;
        Ok(summary)
    }

    /// Optimized pose of vertex `id`.
    pub fn get_pose_at(&self, id: u64) -> Result<Pose2D> {
        let &position = self.index.get(&id).ok_or(SlamError::UnknownVertex(id))?;
        if !self.optimized {
            return Err(SlamError::UnsetPose(id));
        }
        Ok(self.poses[position])
    }

    /// Remove all vertices, edges, the prior and any optimization result.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.poses.clear();
        self.index.clear();
        self.edges.clear();
        self.prior = None;
        self.optimized = false;
    }

    /// Get number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.ids.len()
    }

    /// Get number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get number of loop closure edges.
    pub fn num_loop_closures(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::LoopClosure)
            .count()
    }

    /// Get all edges.
    pub fn edges(&self) -> &[PoseEdge] {
        &self.edges
    }

    /// True once `optimize()` has run since the last structural change.
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// Mean absolute component of all edge errors: Σ|e| / (3 · edges).
    ///
    /// Zero for a graph without edges.
    pub fn mean_edge_error(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }

        let total: f64 = self
            .edges
            .iter()
            .filter_map(|edge| {
                let xi = self.pose_of(edge.from)?;
                let xj = self.pose_of(edge.to)?;
                let e = edge_error(xi, xj, &edge.measurement);
                Some(e.x.abs() + e.y.abs() + e.theta.abs())
            })
            .sum();
        total / (3 * self.edges.len()) as f64
    }

    fn pose_of(&self, id: u64) -> Option<&Pose2D> {
        self.index.get(&id).map(|&i| &self.poses[i])
    }

    pub(super) fn position_of(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub(super) fn poses(&self) -> &[Pose2D] {
        &self.poses
    }

    pub(super) fn poses_mut(&mut self) -> &mut [Pose2D] {
        &mut self.poses
    }

    pub(super) fn prior(&self) -> Option<&Prior> {
        self.prior.as_ref()
    }
}

/// Edge error as a pose: Z⁻¹ ⊕ (X_i⁻¹ ⊕ X_j), angle wrapped to (-π, π].
pub(super) fn edge_error(xi: &Pose2D, xj: &Pose2D, measurement: &Pose2D) -> Pose2D {
    measurement.inverse().compose(&xi.inverse().compose(xj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn graph() -> PoseGraph {
        PoseGraph::default()
    }

    #[test]
    fn test_information_from_std_dev() {
        let info = Information2D::from_std_dev(0.1, 0.2, 0.5);
        assert_relative_eq!(info.xx, 100.0, epsilon = 1e-9);
        assert_relative_eq!(info.yy, 25.0, epsilon = 1e-9);
        assert_relative_eq!(info.tt, 4.0, epsilon = 1e-9);
        assert_eq!(info.xy, 0.0);

        let m = info.to_matrix();
        assert_relative_eq!(m[(1, 1)], 25.0, epsilon = 1e-9);
        assert_eq!(m[(0, 2)], 0.0);
    }

    #[test]
    fn test_duplicate_vertex() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(g.add_vertex(0, 1.0, 0.0, 0.0), Err(SlamError::DuplicateVertex(0)));
        assert_eq!(g.num_vertices(), 1);
    }

    #[test]
    fn test_edge_to_unknown_vertex() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(
            g.add_factor_edge(0, 7, 1.0, 0.0, 0.0, None),
            Err(SlamError::UnknownVertex(7))
        );
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn test_default_edge_information() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        g.add_vertex(1, 1.0, 0.0, 0.0).unwrap();
        g.add_factor_edge(0, 1, 1.0, 0.0, 0.0, None).unwrap();

        let info = g.edges()[0].information;
        assert_relative_eq!(info.xx, 25.0, epsilon = 1e-9);
        assert_relative_eq!(info.tt, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loop_closure_count() {
        let mut g = graph();
        for id in 0..3 {
            g.add_vertex(id, id as f64, 0.0, 0.0).unwrap();
        }
        g.add_factor_edge(0, 1, 1.0, 0.0, 0.0, None).unwrap();
        g.add_factor_edge(1, 2, 1.0, 0.0, 0.0, None).unwrap();
        g.add_loop_closure_edge(2, 0, -2.0, 0.0, 0.0, Some(Information2D::diagonal(1.0, 1.0, 1.0)))
            .unwrap();

        assert_eq!(g.num_loop_closures(), 1);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.edges()[2].kind, EdgeKind::LoopClosure);
        assert_relative_eq!(g.mean_edge_error(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_get_pose_before_optimize() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(g.get_pose_at(0), Err(SlamError::UnsetPose(0)));
        assert_eq!(g.get_pose_at(5), Err(SlamError::UnknownVertex(5)));
    }

    #[test]
    fn test_clear() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        g.add_vertex(1, 1.0, 0.0, 0.0).unwrap();
        g.add_factor_edge(0, 1, 1.0, 0.0, 0.0, None).unwrap();
        g.optimize().unwrap();
        assert!(g.is_optimized());

        g.clear();
        assert_eq!(g.num_vertices(), 0);
        assert_eq!(g.num_edges(), 0);
        assert!(!g.is_optimized());
        assert!(g.prior().is_none());
        assert_eq!(g.get_pose_at(0), Err(SlamError::UnknownVertex(0)));

        // Prior comes back with the prior vertex
        g.add_vertex(0, 5.0, 5.0, 0.0).unwrap();
        assert_relative_eq!(g.prior().map(|p| p.anchor.x).unwrap_or(0.0), 5.0);
    }

    #[test]
    fn test_mean_edge_error() {
        let mut g = graph();
        g.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
        g.add_vertex(1, 1.3, 0.0, 0.0).unwrap();
        g.add_factor_edge(0, 1, 1.0, 0.0, 0.0, None).unwrap();
        // |0.3| + 0 + 0 over 3 components
        assert_relative_eq!(g.mean_edge_error(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_edge_error_wraps_angle() {
        let xi = Pose2D::new(0.0, 0.0, 3.0);
        let xj = Pose2D::new(0.0, 0.0, -3.0);
        let e = edge_error(&xi, &xj, &Pose2D::identity());
        assert_relative_eq!(e.theta, 2.0 * std::f64::consts::PI - 6.0, epsilon = 1e-12);
    }
}
