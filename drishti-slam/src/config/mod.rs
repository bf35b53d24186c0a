//! Configuration loading for DrishtiSLAM.
//!
//! All settings live in a single TOML file; every field has a default, so
//! an empty file (or no file) yields a working pipeline.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drishti_slam::config::SlamConfig;
//!
//! // Load from default path (configs/drishti-slam.toml)
//! let config = SlamConfig::load_default()?;
//!
//! // Or use built-in defaults (no file needed)
//! let config = SlamConfig::default();
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`IcpConfig`] | Iteration cap, tolerance, feature-id gate, coarse search |
//! | [`FrontEndConfig`] | Residual gate, duplicate thresholds, correspondence policy, reference count |
//! | [`PoseGraphConfig`] | Edge and prior noise, anchored vertex |
//! | [`OptimizerConfig`] | Gauss-Newton iteration cap and tolerance |
//!
//! ## Example TOML
//!
//! ```toml
//! [icp]
//! max_icp_iterations = 50
//! icp_tolerance = 1e-6
//!
//! [frontend]
//! keyframe_residual_threshold = 2.0
//! correspondence = "feature_id"   # or "nearest_neighbor"
//!
//! [graph]
//! edge_sigma_angle = 0.1
//! prior_vertex_id = 0
//!
//! [optimizer]
//! backend_max_iterations = 100
//! ```

mod defaults;
mod error;
mod sections;
mod slam;

pub use error::ConfigLoadError;
pub use sections::{CorrespondencePolicy, FrontEndConfig, IcpConfig, OptimizerConfig, PoseGraphConfig};
pub use slam::SlamConfig;
