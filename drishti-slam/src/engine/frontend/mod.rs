//! Keyframe front end.
//!
//! Turns a stream of odometry-stamped scans into a keyframe sequence by
//! aligning each scan with ICP against the most recent keyframes.
//!
//! - [`KeyframeFrontEnd`]: Keyframe selection, loop-closure candidates,
//!   global map reprojection
//! - [`Frame`]: A keyframe with its global pose and creation-time ICP
//!   transform

mod frame;
mod keyframe_frontend;

pub use frame::Frame;
pub use keyframe_frontend::{FrontEndStats, KeyframeDecision, KeyframeFrontEnd};
