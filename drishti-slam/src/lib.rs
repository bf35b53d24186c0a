//! DrishtiSLAM - Keyframe-based 2D SLAM with pose-graph loop closure
//!
//! # Architecture
//!
//! The crate is organized into 3 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │     (keyframe front end, pose graph, back end)      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │                 (registration)                      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                (types, math)                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! `config` and `error` sit beside the layers and are used by all of them.
//!
//! # Data Flow
//!
//! ```text
//! (odometry, scan) ──▶ KeyframeFrontEnd ──ICP vs recent keyframes─▶ keyframes
//!                                                                     │
//! loop scan ──▶ KeyframeFrontEnd ──ICP vs first keyframe──▶ loop frame│
//!                                                                     ▼
//!                              BackEnd: rebuild PoseGraph, Gauss-Newton,
//!                                       write corrected poses back
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 3: SLAM engine (depends on core, algorithms)
// ============================================================================
pub mod engine;

pub mod config;
pub mod error;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::math;
pub use crate::core::types::{Measurement, Point2D, PointCloud2D, Pose2D, ScanPoint};

// Algorithms - Registration
pub use algorithms::registration::{Correspondences, Icp, Registration};

// Engine
pub use engine::graph::{
    EdgeKind, GaussNewton, Information2D, OptimizationSummary, PoseEdge, PoseGraph,
};
pub use engine::{BackEnd, Frame, FrontEndStats, KeyframeDecision, KeyframeFrontEnd, SlamSession};

// Configuration and errors
pub use config::{ConfigLoadError, SlamConfig};
pub use error::{Result, SlamError};
