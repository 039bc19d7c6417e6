//! Bayesian multiple change-point detection.
//!
//! Runs several independently seeded chains of the sampler in
//! [`sampler`], pools their retained draws in chain order and summarizes
//! each break by its posterior mean, median, standard deviation and
//! highest-density interval. Split R-hat above the configured threshold is
//! reported as a warning, never an error.

pub mod diagnostics;
pub mod sampler;

pub use diagnostics::{hdi, split_rhat};
pub use sampler::{run_chain, ChainTrace, ChangePointModel};

use super::config::{BayesianConfig, DetectorConfig};
use super::{
    sanitize_indices, ChangePoint, ChangePointDetector, ConvergenceDiagnostics, Detection,
    DetectionMethod, LocationUncertainty, ParameterRhat, PosteriorSummary, RegimePosterior,
};
use crate::core::ReturnSeries;
use crate::error::{RegimeError, Result};
use crate::regime::annualized_volatility;
use crate::utils::{mean, median, std_dev};
use tracing::{info, warn};

/// Posterior-sampling detector.
#[derive(Debug, Clone, Default)]
pub struct BayesianDetector {
    detector: DetectorConfig,
    config: BayesianConfig,
}

impl BayesianDetector {
    pub fn new(detector: DetectorConfig, config: BayesianConfig) -> Self {
        Self { detector, config }
    }
}

impl ChangePointDetector for BayesianDetector {
    fn name(&self) -> &'static str {
        "bayesian"
    }

    fn detect(&self, returns: &ReturnSeries) -> Result<Detection> {
        let model = ChangePointModel::new(returns.values(), &self.detector, &self.config)?;
        let config = &self.config;

        info!(
            change_points = model.n_change_points(),
            chains = config.chains,
            draws = config.draws,
            tune = config.tune,
            "sampling change-point posterior"
        );
        let traces = run_chains(&model, config)?;

        let k = model.n_change_points();
        let mut change_points = Vec::with_capacity(k);
        let mut rhat = Vec::new();

        for i in 0..k {
            let per_chain: Vec<Vec<f64>> = traces
                .iter()
                .map(|t| t.change_points[i].iter().map(|&c| c as f64).collect())
                .collect();
            rhat.push(ParameterRhat {
                name: format!("cp_{i}"),
                rhat: split_rhat(&per_chain),
            });
            let pooled: Vec<f64> = per_chain.concat();
            change_points.push(summarize_break(&pooled, returns, config.credible_prob)?);
        }

        let mut regime_posteriors = Vec::with_capacity(model.n_regimes());
        for r in 0..model.n_regimes() {
            let mu: Vec<Vec<f64>> = traces.iter().map(|t| t.mu[r].clone()).collect();
            let sigma: Vec<Vec<f64>> = traces.iter().map(|t| t.sigma[r].clone()).collect();
            rhat.push(ParameterRhat {
                name: format!("mu_{r}"),
                rhat: split_rhat(&mu),
            });
            rhat.push(ParameterRhat {
                name: format!("sigma_{r}"),
                rhat: split_rhat(&sigma),
            });

            let (mu, sigma) = (mu.concat(), sigma.concat());
            let sigma_mean = mean(&sigma);
            regime_posteriors.push(RegimePosterior {
                regime: r,
                mu_mean: mean(&mu),
                mu_std: std_dev(&mu),
                sigma_mean,
                sigma_std: std_dev(&sigma),
                annualized_volatility: annualized_volatility(sigma_mean),
            });
        }

        let max_rhat = rhat
            .iter()
            .map(|p| p.rhat)
            .filter(|r| !r.is_nan())
            .fold(f64::NAN, f64::max);
        let exceeding: Vec<&ParameterRhat> = rhat
            .iter()
            .filter(|p| p.rhat > config.rhat_threshold)
            .collect();

        let mut warnings = Vec::new();
        if !exceeding.is_empty() {
            let names: Vec<&str> = exceeding.iter().map(|p| p.name.as_str()).collect();
            warn!(
                parameters = ?names,
                max_rhat,
                "R-hat above threshold; chains may not have converged"
            );
            warnings.push(format!(
                "R-hat above {} for {}; chains may not have converged",
                config.rhat_threshold,
                names.join(", ")
            ));
        }

        let sigma_acceptance_rate =
            traces.iter().map(|t| t.sigma_acceptance).sum::<f64>() / traces.len() as f64;

        // Posterior means are floored, so separation survives; edges are still checked.
        let kept = sanitize_indices(change_points.iter().map(|cp| cp.index).collect(), returns.len());
        change_points.retain(|cp| kept.contains(&cp.index));
        change_points.dedup_by_key(|cp| cp.index);

        info!(
            change_points = change_points.len(),
            max_rhat,
            "Bayesian detection complete"
        );

        Ok(Detection {
            method: DetectionMethod::Bayesian,
            change_points,
            convergence: Some(ConvergenceDiagnostics {
                chains: config.chains,
                draws: config.draws,
                tune: config.tune,
                converged: exceeding.is_empty(),
                rhat,
                max_rhat,
                threshold: config.rhat_threshold,
                sigma_acceptance_rate,
            }),
            regime_posteriors,
            passes: None,
            warnings,
        })
    }
}

/// Summarize pooled draws of one break into a dated change point.
fn summarize_break(draws: &[f64], returns: &ReturnSeries, prob: f64) -> Result<ChangePoint> {
    let posterior_mean = mean(draws);
    let (lower, upper) = hdi(draws, prob)
        .ok_or_else(|| RegimeError::Inference("no posterior draws retained".to_string()))?;
    if !posterior_mean.is_finite() {
        return Err(RegimeError::Inference(
            "posterior mean of a change point is not finite".to_string(),
        ));
    }

    let mean_index = posterior_mean.floor() as usize;
    let median_index = median(draws).floor() as usize;
    let (hdi_lower, hdi_upper) = (lower as usize, upper as usize);

    Ok(ChangePoint {
        index: mean_index,
        date: returns.try_date_at(mean_index)?,
        uncertainty: LocationUncertainty::Posterior(PosteriorSummary {
            mean: posterior_mean,
            mean_index,
            median_index,
            mean_date: returns.try_date_at(mean_index)?,
            median_date: returns.try_date_at(median_index)?,
            std: std_dev(draws),
            hdi_lower,
            hdi_upper,
            hdi_lower_date: returns.try_date_at(hdi_lower)?,
            hdi_upper_date: returns.try_date_at(hdi_upper)?,
            probability: prob,
        }),
    })
}

#[cfg(feature = "parallel")]
fn run_chains(model: &ChangePointModel, config: &BayesianConfig) -> Result<Vec<ChainTrace>> {
    use rayon::prelude::*;

    (0..config.chains)
        .into_par_iter()
        .map(|chain| run_chain(model, config.draws, config.tune, config.seed.wrapping_add(chain as u64)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_chains(model: &ChangePointModel, config: &BayesianConfig) -> Result<Vec<ChainTrace>> {
    (0..config.chains)
        .map(|chain| run_chain(model, config.draws, config.tune, config.seed.wrapping_add(chain as u64)))
        .collect()
}
