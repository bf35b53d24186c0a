//! Default value functions for serde deserialization.

pub fn max_icp_iterations() -> usize {
    50
}

pub fn icp_tolerance() -> f64 {
    1e-6
}

pub fn id_correspondence_max_distance() -> f64 {
    0.5
}

pub fn coarse_rotation_step_deg() -> f64 {
    15.0
}

pub fn coarse_search_trigger_residual() -> f64 {
    0.1
}

pub fn keyframe_residual_threshold() -> f64 {
    2.0
}

pub fn duplicate_translation() -> f64 {
    1.0
}

pub fn duplicate_rotation_deg() -> f64 {
    1.0
}

pub fn reference_keyframes() -> usize {
    2
}

pub fn edge_sigma_xy() -> f64 {
    0.2
}

pub fn edge_sigma_angle() -> f64 {
    0.1
}

pub fn prior_sigma_xy() -> f64 {
    0.1
}

pub fn prior_sigma_theta() -> f64 {
    0.05
}

pub fn backend_max_iterations() -> usize {
    100
}

pub fn backend_tolerance() -> f64 {
    1e-5
}
