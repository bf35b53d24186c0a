//! Core data types for SLAM operations.
//!
//! - [`Point2D`]: 2D point
//! - [`Pose2D`]: Rigid transform / robot pose (x, y, theta)
//! - [`ScanPoint`]: Observed point with an optional feature id
//! - [`PointCloud2D`]: Ordered collection of scan points
//! - [`Measurement`]: Odometry pose plus the scan captured from it

mod cloud;
mod pose;

pub use cloud::{Measurement, PointCloud2D, ScanPoint};
pub use pose::{Point2D, Pose2D};
