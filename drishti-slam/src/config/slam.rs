//! Main SlamConfig and loading methods.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigLoadError;
use super::sections::{FrontEndConfig, IcpConfig, OptimizerConfig, PoseGraphConfig};

/// Full DrishtiSLAM configuration loaded from TOML
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SlamConfig {
    /// ICP registration settings
    #[serde(default)]
    pub icp: IcpConfig,

    /// Keyframe selection settings
    #[serde(default)]
    pub frontend: FrontEndConfig,

    /// Pose graph noise model
    #[serde(default)]
    pub graph: PoseGraphConfig,

    /// Gauss-Newton settings
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl SlamConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io(e.to_string()))?;
        let config = Self::from_toml(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from default config path (configs/drishti-slam.toml)
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new("configs/drishti-slam.toml");
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            basic_toml::from_str(toml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        fn positive(name: &str, value: f64) -> Result<(), ConfigLoadError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigLoadError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }
        fn non_negative(name: &str, value: f64) -> Result<(), ConfigLoadError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigLoadError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )))
            }
        }

        if self.icp.max_icp_iterations == 0 {
            return Err(ConfigLoadError::Invalid(
                "icp.max_icp_iterations must be at least 1".into(),
            ));
        }
        if self.frontend.reference_keyframes == 0 {
            return Err(ConfigLoadError::Invalid(
                "frontend.reference_keyframes must be at least 1".into(),
            ));
        }
        if self.optimizer.backend_max_iterations == 0 {
            return Err(ConfigLoadError::Invalid(
                "optimizer.backend_max_iterations must be at least 1".into(),
            ));
        }

        non_negative("icp.icp_tolerance", self.icp.icp_tolerance)?;
        non_negative(
            "icp.id_correspondence_max_distance",
            self.icp.id_correspondence_max_distance,
        )?;
        non_negative("icp.coarse_rotation_step_deg", self.icp.coarse_rotation_step_deg)?;
        let step = self.icp.coarse_rotation_step_deg;
        if step != 0.0 && step < 1.0 {
            return Err(ConfigLoadError::Invalid(format!(
                "icp.coarse_rotation_step_deg must be 0 or at least 1, got {step}"
            )));
        }
        non_negative(
            "icp.coarse_search_trigger_residual",
            self.icp.coarse_search_trigger_residual,
        )?;

        non_negative(
            "frontend.keyframe_residual_threshold",
            self.frontend.keyframe_residual_threshold,
        )?;
        non_negative("frontend.duplicate_translation", self.frontend.duplicate_translation)?;
        non_negative("frontend.duplicate_rotation_deg", self.frontend.duplicate_rotation_deg)?;

        positive("graph.edge_sigma_x", self.graph.edge_sigma_x)?;
        positive("graph.edge_sigma_y", self.graph.edge_sigma_y)?;
        positive("graph.edge_sigma_angle", self.graph.edge_sigma_angle)?;
        positive("graph.prior_sigma_x", self.graph.prior_sigma_x)?;
        positive("graph.prior_sigma_y", self.graph.prior_sigma_y)?;
        positive("graph.prior_sigma_theta", self.graph.prior_sigma_theta)?;

        non_negative("optimizer.backend_tolerance", self.optimizer.backend_tolerance)
    }
}
