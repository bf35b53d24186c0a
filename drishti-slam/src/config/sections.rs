//! Configuration sections, one per pipeline stage.

use serde::{Deserialize, Serialize};

use super::defaults;

/// ICP registration settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcpConfig {
    /// Hard cap on ICP iterations per call.
    #[serde(default = "defaults::max_icp_iterations")]
    pub max_icp_iterations: usize,

    /// Stop when the mean error changes by less than this between iterations.
    #[serde(default = "defaults::icp_tolerance")]
    pub icp_tolerance: f64,

    /// Largest |id_a - id_b| accepted as a feature-id correspondence.
    #[serde(default = "defaults::id_correspondence_max_distance")]
    pub id_correspondence_max_distance: f64,

    /// Angular spacing of coarse rotation seeds (degrees). 0 disables the
    /// coarse search; otherwise at least 1.
    #[serde(default = "defaults::coarse_rotation_step_deg")]
    pub coarse_rotation_step_deg: f64,

    /// Nearest-neighbor runs ending above this residual trigger the coarse
    /// search.
    #[serde(default = "defaults::coarse_search_trigger_residual")]
    pub coarse_search_trigger_residual: f64,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            max_icp_iterations: defaults::max_icp_iterations(),
            icp_tolerance: defaults::icp_tolerance(),
            id_correspondence_max_distance: defaults::id_correspondence_max_distance(),
            coarse_rotation_step_deg: defaults::coarse_rotation_step_deg(),
            coarse_search_trigger_residual: defaults::coarse_search_trigger_residual(),
        }
    }
}

/// How the front end pairs candidate points with reference points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrespondencePolicy {
    /// Match by feature id, falling back to nearest neighbor for untagged
    /// clouds.
    #[default]
    FeatureId,
    /// Match by Euclidean nearest neighbor.
    NearestNeighbor,
}

/// Keyframe front-end settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrontEndConfig {
    /// Candidates aligning with a larger residual are rejected.
    #[serde(default = "defaults::keyframe_residual_threshold")]
    pub keyframe_residual_threshold: f64,

    /// Translation below which a candidate counts as a duplicate.
    #[serde(default = "defaults::duplicate_translation")]
    pub duplicate_translation: f64,

    /// Rotation (degrees) below which a candidate counts as a duplicate.
    #[serde(default = "defaults::duplicate_rotation_deg")]
    pub duplicate_rotation_deg: f64,

    #[serde(default)]
    pub correspondence: CorrespondencePolicy,

    /// Number of most recent keyframes a candidate is aligned against.
    /// The lowest residual wins.
    #[serde(default = "defaults::reference_keyframes")]
    pub reference_keyframes: usize,
}

impl Default for FrontEndConfig {
    fn default() -> Self {
        Self {
            keyframe_residual_threshold: defaults::keyframe_residual_threshold(),
            duplicate_translation: defaults::duplicate_translation(),
            duplicate_rotation_deg: defaults::duplicate_rotation_deg(),
            correspondence: CorrespondencePolicy::default(),
            reference_keyframes: defaults::reference_keyframes(),
        }
    }
}

/// Pose graph noise model and anchoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseGraphConfig {
    /// Default edge standard deviations (x, y in map units, angle in radians).
    #[serde(default = "defaults::edge_sigma_xy")]
    pub edge_sigma_x: f64,
    #[serde(default = "defaults::edge_sigma_xy")]
    pub edge_sigma_y: f64,
    #[serde(default = "defaults::edge_sigma_angle")]
    pub edge_sigma_angle: f64,

    /// Prior standard deviations on the anchored vertex.
    #[serde(default = "defaults::prior_sigma_xy")]
    pub prior_sigma_x: f64,
    #[serde(default = "defaults::prior_sigma_xy")]
    pub prior_sigma_y: f64,
    #[serde(default = "defaults::prior_sigma_theta")]
    pub prior_sigma_theta: f64,

    /// Vertex held by the prior factor.
    #[serde(default)]
    pub prior_vertex_id: u64,
}

impl Default for PoseGraphConfig {
    fn default() -> Self {
        Self {
            edge_sigma_x: defaults::edge_sigma_xy(),
            edge_sigma_y: defaults::edge_sigma_xy(),
            edge_sigma_angle: defaults::edge_sigma_angle(),
            prior_sigma_x: defaults::prior_sigma_xy(),
            prior_sigma_y: defaults::prior_sigma_xy(),
            prior_sigma_theta: defaults::prior_sigma_theta(),
            prior_vertex_id: 0,
        }
    }
}

/// Gauss-Newton optimizer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "defaults::backend_max_iterations")]
    pub backend_max_iterations: usize,

    /// Converged once the mean absolute edge error is at or below this.
    #[serde(default = "defaults::backend_tolerance")]
    pub backend_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            backend_max_iterations: defaults::backend_max_iterations(),
            backend_tolerance: defaults::backend_tolerance(),
        }
    }
}
