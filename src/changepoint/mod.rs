//! Changepoint detection on return series.
//!
//! Two interchangeable strategies implement [`ChangePointDetector`]:
//!
//! - **Bayesian** (`bayesian` feature): samples the posterior over `K`
//!   ordered break locations with Metropolis-within-Gibbs and reports
//!   credible intervals for every break.
//! - **Segmentation**: PELT with an RBF kernel cost for mean shifts plus
//!   binary segmentation with a Gaussian cost for variance shifts. Break
//!   locations carry no uncertainty.
//!
//! [`run_detection`] resolves the configured [`DetectorStrategy`] and falls
//! back to segmentation when Bayesian inference is unavailable or fails.
//! Configuration errors are never swallowed.
//!
//! # Example
//!
//! ```
//! use brent_regimes::changepoint::{pelt_detect, L2Cost, PeltConfig};
//!
//! // Create series with a level shift
//! let mut series = vec![0.0; 50];
//! series.extend(vec![10.0; 50]);
//!
//! let config = PeltConfig::default().penalty(5.0);
//! let result = pelt_detect(&L2Cost::new(&series), &config);
//!
//! assert_eq!(result.changepoints, vec![50]);
//! ```

#[cfg(feature = "bayesian")]
pub mod bayesian;
pub mod binseg;
pub mod config;
pub mod cost;
pub mod pelt;
pub mod segmentation;

#[cfg(feature = "bayesian")]
pub use bayesian::BayesianDetector;
pub use binseg::{binseg_detect, BinsegConfig, BinsegResult};
pub use config::{BayesianConfig, DetectorConfig, DetectorStrategy, SegmentationConfig};
pub use cost::{
    l2_cost, normal_cost, rbf_gamma_heuristic, KernelCost, L2Cost, NormalCost, PrefixSums,
    SegmentCost,
};
pub use pelt::{pelt_detect, PeltConfig, PeltResult};
pub use segmentation::{merge_breaks, SegmentationDetector};

use crate::core::ReturnSeries;
use crate::error::Result;
use crate::utils::nan_as_null;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Posterior summary of one break location, in return-series index units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    /// Posterior mean before flooring.
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    pub mean_index: usize,
    pub median_index: usize,
    pub mean_date: NaiveDate,
    pub median_date: NaiveDate,
    #[serde(with = "nan_as_null")]
    pub std: f64,
    pub hdi_lower: usize,
    pub hdi_upper: usize,
    pub hdi_lower_date: NaiveDate,
    pub hdi_upper_date: NaiveDate,
    /// Probability mass of the HDI.
    pub probability: f64,
}

/// How well a break location is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationUncertainty {
    /// The method gives a point estimate only.
    Unknown,
    Posterior(PosteriorSummary),
}

impl LocationUncertainty {
    pub fn posterior(&self) -> Option<&PosteriorSummary> {
        match self {
            LocationUncertainty::Posterior(summary) => Some(summary),
            LocationUncertainty::Unknown => None,
        }
    }
}

/// A detected break: the first return of the new regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePoint {
    pub index: usize,
    pub date: NaiveDate,
    pub uncertainty: LocationUncertainty,
}

impl ChangePoint {
    /// Point estimate with unknown uncertainty, dated from the return series.
    pub fn point(index: usize, returns: &ReturnSeries) -> Result<Self> {
        Ok(Self {
            index,
            date: returns.try_date_at(index)?,
            uncertainty: LocationUncertainty::Unknown,
        })
    }
}

/// Which strategy produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Bayesian,
    Segmentation,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Bayesian => f.write_str("Bayesian posterior sampling"),
            DetectionMethod::Segmentation => f.write_str("penalized segmentation"),
        }
    }
}

/// Posterior mean and spread of one regime's parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimePosterior {
    pub regime: usize,
    #[serde(with = "nan_as_null")]
    pub mu_mean: f64,
    #[serde(with = "nan_as_null")]
    pub mu_std: f64,
    #[serde(with = "nan_as_null")]
    pub sigma_mean: f64,
    #[serde(with = "nan_as_null")]
    pub sigma_std: f64,
    /// `sigma_mean * sqrt(252) * 100`.
    #[serde(with = "nan_as_null")]
    pub annualized_volatility: f64,
}

/// Split R-hat of one model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRhat {
    pub name: String,
    #[serde(with = "nan_as_null")]
    pub rhat: f64,
}

/// Sampler convergence summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceDiagnostics {
    pub chains: usize,
    pub draws: usize,
    pub tune: usize,
    pub rhat: Vec<ParameterRhat>,
    #[serde(with = "nan_as_null")]
    pub max_rhat: f64,
    pub threshold: f64,
    pub converged: bool,
    /// Acceptance rate of the variance updates.
    pub sigma_acceptance_rate: f64,
}

/// Intermediate results of the two segmentation passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationPasses {
    pub mean_shift: Vec<usize>,
    pub variance_shift: Vec<usize>,
    pub penalty: f64,
    pub gamma: f64,
}

/// Output of a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub method: DetectionMethod,
    /// Ordered change points, separated by at least `min_separation`.
    pub change_points: Vec<ChangePoint>,
    pub convergence: Option<ConvergenceDiagnostics>,
    pub regime_posteriors: Vec<RegimePosterior>,
    pub passes: Option<SegmentationPasses>,
    pub warnings: Vec<String>,
}

impl Detection {
    pub fn indices(&self) -> Vec<usize> {
        self.change_points.iter().map(|cp| cp.index).collect()
    }
}

/// A change-point detection strategy.
pub trait ChangePointDetector {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// Detect change points in a return series.
    ///
    /// Implementations validate their configuration against the series
    /// length before doing any work.
    fn detect(&self, returns: &ReturnSeries) -> Result<Detection>;
}

/// Whether the Bayesian strategy is compiled in.
pub fn bayesian_available() -> bool {
    cfg!(feature = "bayesian")
}

/// Drop indices at 0 or at/after `n - 1`, then sort and deduplicate.
pub fn sanitize_indices(mut indices: Vec<usize>, n: usize) -> Vec<usize> {
    indices.retain(|&i| i > 0 && i + 1 < n);
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Run `primary`, switching to `fallback` when it fails at run time.
///
/// Configuration errors from either detector propagate unchanged. Any other
/// failure of `primary` is logged and recorded as the first warning of the
/// fallback's detection.
pub fn detect_with_fallback(
    primary: &dyn ChangePointDetector,
    fallback: &dyn ChangePointDetector,
    returns: &ReturnSeries,
) -> Result<Detection> {
    info!(strategy = primary.name(), "running change-point detection");
    let err = match primary.detect(returns) {
        Ok(detection) => return Ok(detection),
        Err(err) if err.is_configuration() => return Err(err),
        Err(err) => err,
    };

    warn!(
        error = %err,
        primary = primary.name(),
        fallback = fallback.name(),
        "change-point detection failed; falling back"
    );
    let mut detection = fallback.detect(returns)?;
    detection.warnings.insert(
        0,
        format!(
            "{} inference failed ({err}); used {} instead",
            primary.name(),
            fallback.name()
        ),
    );
    Ok(detection)
}

/// Run the configured strategy with fallback to segmentation.
///
/// # Errors
/// Configuration errors from either strategy. Inference failures of the
/// Bayesian strategy are downgraded to a warning on the returned detection.
pub fn run_detection(
    returns: &ReturnSeries,
    detector: &DetectorConfig,
    bayesian: &BayesianConfig,
    segmentation: &SegmentationConfig,
) -> Result<Detection> {
    detector.validate_for(returns.len())?;
    segmentation.validate()?;

    let mut notes = Vec::new();
    let use_bayesian = match detector.strategy {
        DetectorStrategy::Auto => bayesian_available(),
        DetectorStrategy::Segmentation => false,
        DetectorStrategy::Bayesian if bayesian_available() => true,
        DetectorStrategy::Bayesian => {
            let note = "Bayesian detection is not compiled in; used segmentation instead";
            warn!("{note}");
            notes.push(note.to_string());
            false
        }
    };

    let fallback = SegmentationDetector::new(detector.clone(), segmentation.clone());
    let mut detection = if use_bayesian {
        bayesian.validate()?;
        run_bayesian(returns, detector, bayesian, &fallback)?
    } else {
        info!(strategy = fallback.name(), "running change-point detection");
        fallback.detect(returns)?
    };
    notes.append(&mut detection.warnings);
    detection.warnings = notes;
    Ok(detection)
}

#[cfg(feature = "bayesian")]
fn run_bayesian(
    returns: &ReturnSeries,
    detector: &DetectorConfig,
    config: &BayesianConfig,
    fallback: &SegmentationDetector,
) -> Result<Detection> {
    let primary = BayesianDetector::new(detector.clone(), config.clone());
    detect_with_fallback(&primary, fallback, returns)
}

#[cfg(not(feature = "bayesian"))]
fn run_bayesian(
    returns: &ReturnSeries,
    _detector: &DetectorConfig,
    _config: &BayesianConfig,
    fallback: &SegmentationDetector,
) -> Result<Detection> {
    fallback.detect(returns)
}
