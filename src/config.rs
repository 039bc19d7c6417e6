//! Top-level analysis configuration.
//!
//! Every section has defaults, so a JSON file only needs the keys it
//! overrides:
//!
//! ```json
//! { "detector": { "n_change_points": 5 }, "bayesian": { "seed": 7 } }
//! ```

use crate::changepoint::{BayesianConfig, DetectorConfig, DetectorStrategy, SegmentationConfig};
use crate::error::{RegimeError, Result};
use crate::events::{AssociationConfig, ImpactConfig};
use crate::validation::VolatilityConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: DetectorConfig,
    pub bayesian: BayesianConfig,
    pub segmentation: SegmentationConfig,
    pub association: AssociationConfig,
    pub impact: ImpactConfig,
    pub volatility: VolatilityConfig,
}

impl AnalysisConfig {
    /// Parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RegimeError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn n_change_points(mut self, k: usize) -> Self {
        self.detector = self.detector.n_change_points(k);
        self
    }

    pub fn min_separation(mut self, separation: usize) -> Self {
        self.detector = self.detector.min_separation(separation);
        self
    }

    pub fn strategy(mut self, strategy: DetectorStrategy) -> Self {
        self.detector = self.detector.strategy(strategy);
        self
    }

    /// Seeds both the sampler and the kernel feature map.
    pub fn seed(mut self, seed: u64) -> Self {
        self.bayesian = self.bayesian.seed(seed);
        self.segmentation.seed = seed;
        self
    }

    pub fn draws(mut self, draws: usize) -> Self {
        self.bayesian = self.bayesian.draws(draws);
        self
    }

    pub fn tune(mut self, tune: usize) -> Self {
        self.bayesian = self.bayesian.tune(tune);
        self
    }

    pub fn chains(mut self, chains: usize) -> Self {
        self.bayesian = self.bayesian.chains(chains);
        self
    }

    pub fn penalty(mut self, penalty: f64) -> Self {
        self.segmentation = self.segmentation.penalty(penalty);
        self
    }

    pub fn window_days(mut self, days: i64) -> Self {
        self.association = self.association.window_days(days);
        self
    }

    /// Check every section. Length-dependent checks run later against the
    /// cleaned series.
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.bayesian.validate()?;
        self.segmentation.validate()?;
        self.association.validate()?;
        self.impact.validate()?;
        self.volatility.validate()
    }
}
