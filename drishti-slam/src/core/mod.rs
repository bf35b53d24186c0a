//! Core foundation layer.
//!
//! This is the bottom layer of the SLAM stack with no internal dependencies.
//! All other layers depend on core.
//!
//! # Contents
//!
//! - [`types`]: Core data types (poses, point clouds, measurements)
//! - [`math`]: Angle normalization

pub mod math;
pub mod types;
