//! Detector configuration.
//!
//! [`DetectorConfig`] holds the settings shared by both strategies and the
//! feasibility checks that run before any sampling or segmentation.
//! [`BayesianConfig`] and [`SegmentationConfig`] tune the two strategies.

use crate::error::{RegimeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which detector to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorStrategy {
    /// Bayesian when compiled in, otherwise segmentation.
    #[default]
    Auto,
    Bayesian,
    Segmentation,
}

impl FromStr for DetectorStrategy {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(DetectorStrategy::Auto),
            "bayesian" | "mcmc" => Ok(DetectorStrategy::Bayesian),
            "segmentation" | "pelt" => Ok(DetectorStrategy::Segmentation),
            other => Err(RegimeError::InvalidParameter(format!(
                "unknown strategy '{other}' (expected auto, bayesian or segmentation)"
            ))),
        }
    }
}

impl fmt::Display for DetectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DetectorStrategy::Auto => "auto",
            DetectorStrategy::Bayesian => "bayesian",
            DetectorStrategy::Segmentation => "segmentation",
        };
        f.write_str(label)
    }
}

/// Settings common to both detection strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of change points `K` for the Bayesian model; also the default
    /// break count of the variance pass.
    pub n_change_points: usize,
    /// Minimum observations between consecutive change points and at both
    /// ends of the series.
    pub min_separation: usize,
    /// Upper bound of the first change point as a fraction of `n`.
    pub first_range_cap: f64,
    /// Upper bound of later change points as a fraction of `n`.
    pub range_cap: f64,
    pub strategy: DetectorStrategy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            n_change_points: 3,
            min_separation: 50,
            first_range_cap: 0.8,
            range_cap: 0.9,
            strategy: DetectorStrategy::Auto,
        }
    }
}

impl DetectorConfig {
    pub fn n_change_points(mut self, k: usize) -> Self {
        self.n_change_points = k;
        self
    }

    pub fn min_separation(mut self, separation: usize) -> Self {
        self.min_separation = separation;
        self
    }

    pub fn range_caps(mut self, first: f64, rest: f64) -> Self {
        self.first_range_cap = first;
        self.range_cap = rest;
        self
    }

    pub fn strategy(mut self, strategy: DetectorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shortest series accepted: `2 * min_separation * (K + 1)`.
    pub fn min_series_len(&self) -> usize {
        2 * self.min_separation * (self.n_change_points + 1)
    }

    /// Validate parameters that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.n_change_points == 0 {
            return Err(RegimeError::InvalidParameter(
                "n_change_points must be at least 1".to_string(),
            ));
        }
        if self.min_separation < 3 {
            return Err(RegimeError::InvalidParameter(format!(
                "min_separation must be at least 3, got {}",
                self.min_separation
            )));
        }
        let caps_ok = self.first_range_cap > 0.0
            && self.first_range_cap <= self.range_cap
            && self.range_cap <= 1.0;
        if !caps_ok {
            return Err(RegimeError::InvalidParameter(format!(
                "range caps must satisfy 0 < first ({}) <= rest ({}) <= 1",
                self.first_range_cap, self.range_cap
            )));
        }
        Ok(())
    }

    /// Validate against a series of length `n`, including feasibility of the
    /// change-point prior.
    pub fn validate_for(&self, n: usize) -> Result<()> {
        self.validate()?;

        let needed = self.min_series_len();
        if n < needed {
            return Err(RegimeError::InsufficientData { needed, got: n });
        }

        let upper = self.upper_bounds(n);
        for (i, &u) in upper.iter().enumerate() {
            let lower = (i + 1) * self.min_separation;
            if u < lower {
                return Err(RegimeError::InvalidParameter(format!(
                    "change point {i} has empty support [{lower}, {u}]; raise the range caps"
                )));
            }
        }
        Ok(())
    }

    /// Upper bound `U_i` of each change point's support.
    ///
    /// `U_{K-1} = min(floor(cap * n), n - sep)` and
    /// `U_i = min(floor(cap_i * n), U_{i+1} - sep)`, so every regime keeps at
    /// least `sep` observations. Bounds saturate at zero for infeasible
    /// settings; [`validate_for`](Self::validate_for) rejects those.
    pub fn upper_bounds(&self, n: usize) -> Vec<usize> {
        let k = self.n_change_points;
        let sep = self.min_separation;
        let mut bounds = vec![0; k];

        let mut next: Option<usize> = None;
        for i in (0..k).rev() {
            let cap = if i == 0 {
                self.first_range_cap
            } else {
                self.range_cap
            };
            let from_cap = (cap * n as f64).floor() as usize;
            let from_next = match next {
                Some(u) => u.saturating_sub(sep),
                None => n.saturating_sub(sep),
            };
            bounds[i] = from_cap.min(from_next);
            next = Some(bounds[i]);
        }
        bounds
    }
}

/// Settings of the Bayesian posterior-sampling strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianConfig {
    /// Retained draws per chain.
    pub draws: usize,
    /// Warm-up iterations per chain, discarded.
    pub tune: usize,
    pub chains: usize,
    pub seed: u64,
    /// Probability mass of the highest-density interval.
    pub credible_prob: f64,
    /// Split R-hat above this value raises a convergence warning.
    pub rhat_threshold: f64,
    /// Standard deviation of the Normal(0, sd) prior on regime means.
    pub mu_prior_sd: f64,
    /// Scale of the HalfNormal prior on regime standard deviations.
    pub sigma_prior_scale: f64,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            draws: 2000,
            tune: 1000,
            chains: 4,
            seed: 42,
            credible_prob: 0.95,
            rhat_threshold: 1.1,
            mu_prior_sd: 0.1,
            sigma_prior_scale: 0.1,
        }
    }
}

impl BayesianConfig {
    pub fn draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    pub fn tune(mut self, tune: usize) -> Self {
        self.tune = tune;
        self
    }

    pub fn chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn credible_prob(mut self, prob: f64) -> Self {
        self.credible_prob = prob;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.draws < 4 {
            return Err(RegimeError::InvalidParameter(format!(
                "draws must be at least 4, got {}",
                self.draws
            )));
        }
        if self.chains == 0 {
            return Err(RegimeError::InvalidParameter(
                "chains must be at least 1".to_string(),
            ));
        }
        if !(self.credible_prob > 0.0 && self.credible_prob < 1.0) {
            return Err(RegimeError::InvalidParameter(format!(
                "credible_prob must lie in (0, 1), got {}",
                self.credible_prob
            )));
        }
        if !(self.rhat_threshold >= 1.0) {
            return Err(RegimeError::InvalidParameter(format!(
                "rhat_threshold must be at least 1, got {}",
                self.rhat_threshold
            )));
        }
        if !(self.mu_prior_sd > 0.0 && self.sigma_prior_scale > 0.0) {
            return Err(RegimeError::InvalidParameter(
                "prior scales must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of the penalized-segmentation strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// PELT penalty per change point; higher means fewer breaks.
    pub penalty: f64,
    /// Candidate grid spacing for the mean-shift pass.
    pub jump: usize,
    /// Random Fourier features approximating the RBF kernel.
    pub n_features: usize,
    /// RBF bandwidth; `None` uses `1 / median(pairwise squared distance)`.
    pub gamma: Option<f64>,
    /// Target breaks of the variance pass; `None` uses `K`.
    pub variance_breaks: Option<usize>,
    /// Seed of the feature map.
    pub seed: u64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            penalty: 10.0,
            jump: 5,
            n_features: 64,
            gamma: None,
            variance_breaks: None,
            seed: 42,
        }
    }
}

impl SegmentationConfig {
    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn jump(mut self, jump: usize) -> Self {
        self.jump = jump;
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn variance_breaks(mut self, breaks: usize) -> Self {
        self.variance_breaks = Some(breaks);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.penalty.is_finite() && self.penalty >= 0.0) {
            return Err(RegimeError::InvalidParameter(format!(
                "penalty must be finite and non-negative, got {}",
                self.penalty
            )));
        }
        if self.jump == 0 {
            return Err(RegimeError::InvalidParameter(
                "jump must be at least 1".to_string(),
            ));
        }
        if self.n_features == 0 {
            return Err(RegimeError::InvalidParameter(
                "n_features must be at least 1".to_string(),
            ));
        }
        if let Some(gamma) = self.gamma {
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(RegimeError::InvalidParameter(format!(
                    "gamma must be finite and positive, got {gamma}"
                )));
            }
        }
        Ok(())
    }
}
