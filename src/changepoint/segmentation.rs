//! Deterministic penalized segmentation.
//!
//! A mean-shift pass runs PELT over an RBF kernel cost; a variance-shift pass
//! runs binary segmentation over the Gaussian cost with a fixed break budget.
//! Breaks of the variance pass are kept only when they are at least
//! `min_separation` away from every break already accepted.

use super::binseg::{binseg_detect, BinsegConfig};
use super::config::{DetectorConfig, SegmentationConfig};
use super::cost::{KernelCost, NormalCost};
use super::pelt::{pelt_detect, PeltConfig};
use super::{
    sanitize_indices, ChangePoint, ChangePointDetector, Detection, DetectionMethod,
    SegmentationPasses,
};
use crate::core::ReturnSeries;
use crate::error::Result;
use tracing::{debug, info};

/// Warning attached to every segmentation result.
pub const UNCERTAINTY_UNAVAILABLE: &str =
    "location uncertainty is unavailable in segmentation mode; change points are point estimates";

/// Two-pass segmentation detector.
#[derive(Debug, Clone, Default)]
pub struct SegmentationDetector {
    detector: DetectorConfig,
    config: SegmentationConfig,
}

impl SegmentationDetector {
    pub fn new(detector: DetectorConfig, config: SegmentationConfig) -> Self {
        Self { detector, config }
    }
}

/// Merge two sorted break lists: every primary break, then secondary breaks
/// at least `min_separation` from all accepted ones. Output is sorted.
pub fn merge_breaks(primary: &[usize], secondary: &[usize], min_separation: usize) -> Vec<usize> {
    let mut merged: Vec<usize> = primary.to_vec();
    for &candidate in secondary {
        if merged.iter().all(|&b| b.abs_diff(candidate) >= min_separation) {
            merged.push(candidate);
        }
    }
    merged.sort_unstable();
    merged
}

impl ChangePointDetector for SegmentationDetector {
    fn name(&self) -> &'static str {
        "segmentation"
    }

    fn detect(&self, returns: &ReturnSeries) -> Result<Detection> {
        let n = returns.len();
        self.detector.validate_for(n)?;
        self.config.validate()?;

        let values = returns.values();
        let separation = self.detector.min_separation;

        let kernel = KernelCost::new(
            values,
            self.config.n_features,
            self.config.gamma,
            self.config.seed,
        )?;
        let pelt_config = PeltConfig::default()
            .penalty(self.config.penalty)
            .min_segment_length(separation)
            .jump(self.config.jump);
        let mean_pass = pelt_detect(&kernel, &pelt_config);
        debug!(
            breaks = mean_pass.n_changepoints,
            gamma = kernel.gamma(),
            "mean-shift pass complete"
        );

        let binseg_config = BinsegConfig::default()
            .n_breaks(
                self.config
                    .variance_breaks
                    .unwrap_or(self.detector.n_change_points),
            )
            .min_segment_length(separation)
            .jump(self.config.jump);
        let variance_pass = binseg_detect(&NormalCost::new(values), &binseg_config);
        debug!(
            breaks = variance_pass.changepoints.len(),
            "variance-shift pass complete"
        );

        let merged = merge_breaks(
            &mean_pass.changepoints,
            &variance_pass.changepoints,
            separation,
        );
        let change_points = sanitize_indices(merged, n)
            .into_iter()
            .map(|index| ChangePoint::point(index, returns))
            .collect::<Result<Vec<_>>>()?;

        info!(
            change_points = change_points.len(),
            mean_shift = mean_pass.n_changepoints,
            variance_shift = variance_pass.changepoints.len(),
            "segmentation detection complete"
        );

        Ok(Detection {
            method: DetectionMethod::Segmentation,
            change_points,
            convergence: None,
            regime_posteriors: Vec::new(),
            passes: Some(SegmentationPasses {
                mean_shift: mean_pass.changepoints,
                variance_shift: variance_pass.changepoints,
                penalty: self.config.penalty,
                gamma: kernel.gamma(),
            }),
            warnings: vec![UNCERTAINTY_UNAVAILABLE.to_string()],
        })
    }
}
