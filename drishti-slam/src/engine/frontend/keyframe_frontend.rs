//! Keyframe selection by scan alignment.
//!
//! Every incoming scan is aligned against each of the most recent
//! `reference_keyframes` keyframes and the lowest-residual alignment decides
//! what happens to it:
//!
//! ```text
//! NEW_SCAN ──(no keyframes)──────────────────────────▶ ACCEPTED_AS_FIRST
//!     │
//!     └──▶ CORRESPONDENCE_SEARCH ──▶ ICP_ALIGN ──┬──▶ REJECTED   (residual > threshold)
//!                                                ├──▶ DUPLICATE  (barely moved)
//!                                                └──▶ ACCEPTED
//! ```

use log::{debug, info};

use super::frame::Frame;
use crate::algorithms::registration::{Correspondences, Icp, Registration};
use crate::config::{CorrespondencePolicy, FrontEndConfig, IcpConfig};
use crate::core::types::{Measurement, PointCloud2D};
use crate::error::{Result, SlamError};

/// Outcome of offering one scan to the front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyframeDecision {
    /// The scan started the trajectory.
    AcceptedAsFirst,
    /// The scan aligned and became a new keyframe.
    Accepted,
    /// The alignment residual exceeded `keyframe_residual_threshold`.
    Rejected { residual: f64 },
    /// The scan aligned but sits on top of the reference keyframe.
    Duplicate,
    /// The scan held no points.
    EmptyScan,
}

impl KeyframeDecision {
    /// True when a keyframe was appended.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::AcceptedAsFirst | Self::Accepted)
    }
}

/// Counters over all scans seen by a front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontEndStats {
    pub scans: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub empty: usize,
}

/// Builds the keyframe sequence from odometry-stamped scans.
#[derive(Debug, Clone)]
pub struct KeyframeFrontEnd {
    config: FrontEndConfig,
    icp: Icp,

    /// All keyframes in chronological order.
    frames: Vec<Frame>,

    stats: FrontEndStats,
}

impl Default for KeyframeFrontEnd {
    fn default() -> Self {
        Self::new(FrontEndConfig::default(), IcpConfig::default())
    }
}

impl KeyframeFrontEnd {
    /// Create a front end with no keyframes.
    pub fn new(config: FrontEndConfig, icp: IcpConfig) -> Self {
        Self {
            config,
            icp: Icp::new(icp),
            frames: Vec::new(),
            stats: FrontEndStats::default(),
        }
    }

    pub fn config(&self) -> &FrontEndConfig {
        &self.config
    }

    /// Offer a scan and report what the front end did with it.
    ///
    /// When no reference keyframe aligns, the degenerate-input error is
    /// returned; a poor alignment is the [`KeyframeDecision::Rejected`]
    /// outcome. A scan whose points all lie on one line is degenerate.
    pub fn process_scan(&mut self, measurement: &Measurement) -> Result<KeyframeDecision> {
        self.stats.scans += 1;

        if measurement.points.is_empty() {
            self.stats.empty += 1;
            debug!("Scan {} is empty, skipped", self.stats.scans);
            return Ok(KeyframeDecision::EmptyScan);
        }

        if self.frames.is_empty() {
            self.frames
                .push(Frame::origin(measurement.odometry, measurement.points.clone()));
            self.stats.accepted += 1;
            info!(
                "First keyframe at ({:.3}, {:.3}, {:.3})",
                measurement.odometry.x, measurement.odometry.y, measurement.odometry.theta
            );
            return Ok(KeyframeDecision::AcceptedAsFirst);
        }

        let (reference, registration) = self.best_alignment(measurement)?;
        let relative = registration.transform;

        if registration.residual > self.config.keyframe_residual_threshold {
            self.stats.rejected += 1;
            debug!(
                "Scan {} rejected: residual {:.4} > {:.4}",
                self.stats.scans, registration.residual, self.config.keyframe_residual_threshold
            );
            return Ok(KeyframeDecision::Rejected {
                residual: registration.residual,
            });
        }

        if relative.translation_norm() < self.config.duplicate_translation
            && relative.theta.abs() < self.config.duplicate_rotation_deg.to_radians()
        {
            self.stats.duplicates += 1;
            debug!(
                "Scan {} duplicates keyframe {}: moved {:.3}, turned {:.2}°",
                self.stats.scans,
                reference,
                relative.translation_norm(),
                relative.theta.to_degrees()
            );
            return Ok(KeyframeDecision::Duplicate);
        }

        let pose = self.frames[reference].pose.compose(&relative);
        self.frames.push(Frame::new(
            pose,
            measurement.odometry,
            measurement.points.clone(),
            reference,
            relative,
            registration.residual,
        ));
        self.stats.accepted += 1;
        info!(
            "Keyframe {} at ({:.3}, {:.3}, {:.3}) from keyframe {}, residual {:.4}",
            self.frames.len() - 1,
            pose.x,
            pose.y,
            pose.theta,
            reference,
            registration.residual
        );
        Ok(KeyframeDecision::Accepted)
    }

    /// Offer a scan; true iff it was appended as a keyframe.
    pub fn add_key_frame(&mut self, measurement: &Measurement) -> Result<bool> {
        Ok(self.process_scan(measurement)?.is_accepted())
    }

    /// Align a scan against the first keyframe without committing it.
    ///
    /// Returns the candidate frame, whose relative transform is its pose in
    /// the first keyframe's coordinates, or `None` when there is nothing to
    /// close against or the alignment fails the residual gate.
    pub fn create_loop_closure(&self, measurement: &Measurement) -> Result<Option<Frame>> {
        let Some(first) = self.frames.first() else {
            debug!("Loop closure requested without keyframes");
            return Ok(None);
        };
        if measurement.points.is_empty() {
            debug!("Loop closure requested with an empty scan");
            return Ok(None);
        }

        let registration = self.align(first, measurement)?;
        if registration.residual > self.config.keyframe_residual_threshold {
            debug!(
                "Loop closure rejected: residual {:.4} > {:.4}",
                registration.residual, self.config.keyframe_residual_threshold
            );
            return Ok(None);
        }

        let relative = registration.transform;
        info!(
            "Loop closure against keyframe 0: ({:.3}, {:.3}, {:.3}), residual {:.4}",
            relative.x, relative.y, relative.theta, registration.residual
        );
        Ok(Some(Frame::new(
            first.pose.compose(&relative),
            measurement.odometry,
            measurement.points.clone(),
            0,
            relative,
            registration.residual,
        )))
    }

    /// Get all keyframes.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Keyframes for pose correction.
    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }

    /// All keyframe scans reprojected into the world frame.
    pub fn global_map(&self) -> PointCloud2D {
        let total = self.frames.iter().map(|f| f.points().len()).sum();
        let mut map = PointCloud2D::with_capacity(total);
        for frame in &self.frames {
            map.extend(&frame.global_points());
        }
        map
    }

    pub fn stats(&self) -> FrontEndStats {
        self.stats
    }

    /// Align against the most recent keyframes, newest first, and keep the
    /// lowest residual. A reference that fails to align is skipped; the
    /// newest reference's error is returned when none aligns.
    fn best_alignment(&self, measurement: &Measurement) -> Result<(usize, Registration)> {
        let Some(newest) = self.frames.len().checked_sub(1) else {
            return Err(SlamError::InsufficientKeyframes { count: 0 });
        };
        let oldest = self.frames.len().saturating_sub(self.config.reference_keyframes.max(1));

        let mut best: Option<(usize, Registration)> = None;
        let mut first_error = None;
        for index in (oldest..=newest).rev() {
            match self.align(&self.frames[index], measurement) {
                Ok(registration) => {
                    debug!(
                        "Scan {} vs keyframe {}: residual {:.4}",
                        self.stats.scans, index, registration.residual
                    );
                    if best
                        .as_ref()
                        .is_none_or(|(_, b)| registration.residual < b.residual)
                    {
                        best = Some((index, registration));
                    }
                }
                Err(e) => {
                    debug!("Scan {} vs keyframe {} failed: {}", self.stats.scans, index, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (best, first_error) {
            (Some(best), _) => Ok(best),
            (None, Some(e)) => Err(e),
            (None, None) => Err(SlamError::InsufficientKeyframes { count: 0 }),
        }
    }

    /// Run ICP with the candidate as source and the reference as target,
    /// seeded with the odometry delta between them.
    fn align(&self, reference: &Frame, measurement: &Measurement) -> Result<Registration> {
        let seed = reference.odometry().inverse().compose(&measurement.odometry);
        let mode = self.correspondences(&measurement.points, reference.points());
        self.icp
            .find_transform_from(&measurement.points, reference.points(), mode, &seed)
    }

    fn correspondences(
        &self,
        candidate: &PointCloud2D,
        reference: &PointCloud2D,
    ) -> Correspondences<'static> {
        match self.config.correspondence {
            CorrespondencePolicy::NearestNeighbor => Correspondences::NearestNeighbor,
            CorrespondencePolicy::FeatureId
                if candidate.has_feature_ids() && reference.has_feature_ids() =>
            {
                Correspondences::FeatureId
            }
            CorrespondencePolicy::FeatureId => {
                debug!("Untagged scan, falling back to nearest-neighbor correspondences");
                Correspondences::NearestNeighbor
            }
        }
    }
}
