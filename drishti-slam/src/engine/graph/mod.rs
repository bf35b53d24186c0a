//! Pose graph optimization.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      POSE GRAPH                             │
//! │                                                             │
//! │    Vertices: Keyframe poses, keyed by id                    │
//! │                                                             │
//! │    Edges: Relative constraints between poses                │
//! │           - Sequential (consecutive keyframes)              │
//! │           - Loop closure (back to an earlier keyframe)      │
//! │                                                             │
//! │    [P0] ──seq──▶ [P1] ──seq──▶ [P2] ──seq──▶ [P3]           │
//! │     ▲                                          │            │
//! │     └──────────────── loop closure ────────────┘            │
//! │                                                             │
//! │    Prior: P0 held at its inserted pose                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     OPTIMIZATION                            │
//! │                                                             │
//! │    Minimize: Σ ||error(edge)||² weighted by information     │
//! │                                                             │
//! │    Method: Gauss-Newton on SE(2)                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use drishti_slam::engine::graph::PoseGraph;
//!
//! let mut graph = PoseGraph::default();
//! graph.add_vertex(0, 0.0, 0.0, 0.0).unwrap();
//! graph.add_vertex(1, 0.9, 0.1, 0.0).unwrap();
//! graph.add_factor_edge(0, 1, 1.0, 0.0, 0.0, None).unwrap();
//!
//! let summary = graph.optimize().unwrap();
//! assert!(summary.converged);
//!
//! let pose = graph.get_pose_at(1).unwrap();
//! assert!((pose.x - 1.0).abs() < 1e-3);
//! ```

mod optimizer;
mod pose_graph;

pub use optimizer::{GaussNewton, OptimizationSummary};
pub use pose_graph::{EdgeKind, Information2D, PoseEdge, PoseGraph};
