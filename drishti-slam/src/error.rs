//! Error types for DrishtiSLAM

use thiserror::Error;

/// DrishtiSLAM error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlamError {
    /// Registration could not determine a rigid transform.
    #[error("Degenerate registration input ({correspondences} correspondences): {reason}")]
    DegenerateInput {
        correspondences: usize,
        reason: &'static str,
    },

    /// Pose queried before the graph was optimized.
    #[error("Pose of vertex {0} is not set; run optimize() first")]
    UnsetPose(u64),

    #[error("Unknown vertex {0}")]
    UnknownVertex(u64),

    #[error("Vertex {0} already exists")]
    DuplicateVertex(u64),

    /// Every Gauss-Newton iteration was numerically unstable.
    #[error("Pose graph optimization failed: {iterations} unstable iterations without convergence")]
    ConvergenceFailure { iterations: usize },

    #[error("Back end needs at least 2 keyframes, got {count}")]
    InsufficientKeyframes { count: usize },
}

pub type Result<T> = std::result::Result<T, SlamError>;
