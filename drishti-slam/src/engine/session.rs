//! One SLAM run: a front end and a back end driven together.

use log::info;

use super::backend::BackEnd;
use super::frontend::{Frame, KeyframeDecision, KeyframeFrontEnd};
use super::graph::OptimizationSummary;
use crate::config::SlamConfig;
use crate::core::types::Measurement;
use crate::error::Result;

/// Owns the keyframe front end and the pose-graph back end of one run.
///
/// # Example
///
/// ```
/// use drishti_slam::config::SlamConfig;
/// use drishti_slam::core::types::{Measurement, PointCloud2D, Pose2D};
/// use drishti_slam::engine::{KeyframeDecision, SlamSession};
///
/// let mut scan = PointCloud2D::new();
/// for i in 0..8 {
///     scan.push_tagged(3.0, i as f64 * 0.5 - 2.0, i);
///     scan.push_tagged(i as f64 * 0.5 - 1.0, 2.5, 100 + i);
/// }
///
/// let mut session = SlamSession::new(SlamConfig::default());
/// let decision = session
///     .process(&Measurement::new(Pose2D::identity(), scan))
///     .unwrap();
///
/// assert_eq!(decision, KeyframeDecision::AcceptedAsFirst);
/// assert_eq!(session.frames().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SlamSession {
    front_end: KeyframeFrontEnd,
    back_end: BackEnd,
}

impl Default for SlamSession {
    fn default() -> Self {
        Self::new(SlamConfig::default())
    }
}

impl SlamSession {
    pub fn new(config: SlamConfig) -> Self {
        let SlamConfig {
            icp,
            frontend,
            graph,
            optimizer,
        } = config;
        Self {
            front_end: KeyframeFrontEnd::new(frontend, icp),
            back_end: BackEnd::new(graph, optimizer),
        }
    }

    /// Forward a measurement to the front end.
    pub fn process(&mut self, measurement: &Measurement) -> Result<KeyframeDecision> {
        self.front_end.process_scan(measurement)
    }

    /// Close the loop with a scan taken back at the start and correct every
    /// keyframe pose.
    ///
    /// Returns `None` when the scan does not align with the first keyframe.
    pub fn close_loop(&mut self, measurement: &Measurement) -> Result<Option<OptimizationSummary>> {
        let Some(loop_frame) = self.front_end.create_loop_closure(measurement)? else {
            info!("Loop closure candidate rejected, poses unchanged");
            return Ok(None);
        };

        let summary = self
            .back_end
            .update_frames(self.front_end.frames_mut(), &loop_frame)?;
        Ok(Some(summary))
    }

    /// Keyframes with their current (possibly corrected) poses.
    pub fn frames(&self) -> &[Frame] {
        self.front_end.frames()
    }

    pub fn front_end(&self) -> &KeyframeFrontEnd {
        &self.front_end
    }

    pub fn back_end(&self) -> &BackEnd {
        &self.back_end
    }
}
