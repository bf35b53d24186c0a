//! Back end: global pose correction after a loop closure.
//!
//! The pose graph is rebuilt from scratch on every pass:
//!
//! ```text
//! vertex i      ← frames[i].pose
//! edge (r, i)   ← frames[i].relative_transform(),  r = frames[i].reference_index()
//! edge (n-1, 0) ← loop_frame.relative_transform()⁻¹
//! ```
//!
//! Vertex ids start at the graph's `prior_vertex_id`, so the prior always
//! anchors the first keyframe.
//!
//! The loop frame is a scan taken at the last keyframe's pose and aligned
//! against the first keyframe, so its relative transform places the last
//! keyframe in the first one's coordinates. The edge runs the other way.

use log::{debug, info};

use super::frontend::Frame;
use super::graph::{OptimizationSummary, PoseGraph};
use crate::config::{OptimizerConfig, PoseGraphConfig};
use crate::error::{Result, SlamError};

/// Rebuilds and optimizes the pose graph over a keyframe sequence.
#[derive(Debug, Clone, Default)]
pub struct BackEnd {
    graph: PoseGraph,
}

impl BackEnd {
    pub fn new(graph: PoseGraphConfig, optimizer: OptimizerConfig) -> Self {
        Self {
            graph: PoseGraph::new(graph, optimizer),
        }
    }

    /// Graph built by the last [`BackEnd::update_frames`] call.
    pub fn graph(&self) -> &PoseGraph {
        &self.graph
    }

    /// Optimize keyframe poses under a loop closure from the last keyframe
    /// back to the first, writing the corrected poses into `frames`.
    ///
    /// Relative transforms are left untouched. On error, `frames` is not
    /// modified.
    pub fn update_frames(
        &mut self,
        frames: &mut [Frame],
        loop_frame: &Frame,
    ) -> Result<OptimizationSummary> {
        if frames.len() < 2 {
            return Err(SlamError::InsufficientKeyframes {
                count: frames.len(),
            });
        }

        let base = self.graph.config().prior_vertex_id;
        let vertex = |index: usize| base.saturating_add(index as u64);

        self.graph.clear();
        for (index, frame) in frames.iter().enumerate() {
            self.graph
                .add_vertex(vertex(index), frame.pose.x, frame.pose.y, frame.pose.theta)?;
            if index > 0 {
                let z = frame.relative_transform();
                let from = vertex(frame.reference_index());
                self.graph
                    .add_factor_edge(from, vertex(index), z.x, z.y, z.theta, None)?;
            }
        }

        let last = vertex(frames.len() - 1);
        let closure = loop_frame.relative_transform().inverse();
        self.graph
            .add_loop_closure_edge(last, base, closure.x, closure.y, closure.theta, None)?;
        debug!(
            "Pose graph rebuilt: {} vertices, {} edges, error {:.4e}",
            self.graph.num_vertices(),
            self.graph.num_edges(),
            self.graph.mean_edge_error()
        );

        let summary = self.graph.optimize()?;

        let poses = (0..frames.len())
            .map(|index| self.graph.get_pose_at(vertex(index)))
            .collect::<Result<Vec<_>>>()?;
        for (frame, pose) in frames.iter_mut().zip(poses) {
            frame.pose = pose;
        }

        info!(
            "Back end corrected {} keyframes in {} iterations (converged: {})",
            frames.len(),
            summary.iterations,
            summary.converged
        );
        Ok(summary)
    }
}
