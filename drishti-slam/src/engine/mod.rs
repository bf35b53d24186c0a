//! SLAM orchestration layer.
//!
//! This layer coordinates the SLAM algorithms into a unified system.
//!
//! # Contents
//!
//! - [`frontend`]: Keyframe selection by ICP, loop-closure candidates
//! - [`graph`]: Pose graph and Gauss-Newton optimization
//! - [`BackEnd`]: Rebuilds the graph from keyframes and corrects their poses
//! - [`SlamSession`]: Front end and back end driven together

mod backend;
pub mod frontend;
pub mod graph;
mod session;

pub use backend::BackEnd;
pub use frontend::{Frame, FrontEndStats, KeyframeDecision, KeyframeFrontEnd};
pub use session::SlamSession;
