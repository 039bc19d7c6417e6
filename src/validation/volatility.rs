//! Volatility clustering diagnostics.
//!
//! Large moves tend to follow large moves. The autocorrelation of absolute
//! returns measures this, and a trailing rolling standard deviation shows
//! where volatility peaked.

use crate::core::ReturnSeries;
use crate::error::{RegimeError, Result};
use crate::utils::{autocorrelation, nan_as_null, nan_vec_as_null, rolling_std};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Settings for [`volatility_clustering`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Largest lag of the absolute-return autocorrelation.
    pub max_lag: usize,
    /// Rolling volatility window in observations.
    pub rolling_window: usize,
    /// `|acf(1)|` above this marks clustering as strong.
    pub strong_threshold: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            max_lag: 20,
            rolling_window: 30,
            strong_threshold: 0.1,
        }
    }
}

impl VolatilityConfig {
    pub fn max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_lag == 0 {
            return Err(RegimeError::InvalidParameter(
                "volatility max_lag must be at least 1".to_string(),
            ));
        }
        if self.rolling_window < 2 {
            return Err(RegimeError::InvalidParameter(
                "rolling_window must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Volatility clustering summary of a return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityClustering {
    /// Autocorrelation of `|r|` at lags `1..=max_lag`.
    #[serde(with = "nan_vec_as_null")]
    pub abs_return_acf: Vec<f64>,
    /// Whether `|acf(1)|` exceeds the strong threshold.
    pub strong: bool,
    pub rolling_window: usize,
    #[serde(with = "nan_as_null")]
    pub mean_rolling_volatility: f64,
    #[serde(with = "nan_as_null")]
    pub peak_rolling_volatility: f64,
    pub peak_date: Option<NaiveDate>,
}

impl VolatilityClustering {
    pub fn first_order_acf(&self) -> f64 {
        self.abs_return_acf.first().copied().unwrap_or(f64::NAN)
    }
}

/// Compute volatility clustering diagnostics. Lags beyond the series length
/// are omitted; a series shorter than the window has no rolling peak.
pub fn volatility_clustering(
    returns: &ReturnSeries,
    config: &VolatilityConfig,
) -> VolatilityClustering {
    let values = returns.values();
    let abs_returns: Vec<f64> = values.iter().map(|r| r.abs()).collect();

    let abs_return_acf: Vec<f64> = (1..=config.max_lag)
        .take_while(|&lag| lag < abs_returns.len())
        .map(|lag| autocorrelation(&abs_returns, lag))
        .collect();

    let strong = abs_return_acf
        .first()
        .is_some_and(|acf| acf.abs() > config.strong_threshold);

    let rolling = rolling_std(values, config.rolling_window);
    let finite: Vec<(usize, f64)> = rolling
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .collect();

    let mean_rolling_volatility = if finite.is_empty() {
        f64::NAN
    } else {
        finite.iter().map(|(_, v)| v).sum::<f64>() / finite.len() as f64
    };

    let peak = finite
        .iter()
        .copied()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        });

    VolatilityClustering {
        abs_return_acf,
        strong,
        rolling_window: config.rolling_window,
        mean_rolling_volatility,
        peak_rolling_volatility: peak.map_or(f64::NAN, |(_, v)| v),
        peak_date: peak.and_then(|(i, _)| returns.date_at(i)),
    }
}
