//! Regime quantification.
//!
//! Change points partition the return series into contiguous index
//! intervals `[b_i, b_{i+1})`. Each regime starts on the date of its first
//! return and ends on the start date of the next regime (the series end for
//! the last one), so durations add up to the span of the series.

use crate::core::ReturnSeries;
use crate::error::{RegimeError, Result};
use crate::utils::{mean, nan_as_null, std_dev_or_zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Annualization factor for daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily standard deviation to annualized volatility in percent.
pub fn annualized_volatility(daily_std: f64) -> f64 {
    daily_std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Statistics of one regime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    /// 0-based position among the regimes.
    pub ordinal: usize,
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    pub observations: usize,
    #[serde(with = "nan_as_null")]
    pub mean_return: f64,
    #[serde(with = "nan_as_null")]
    pub return_std: f64,
    #[serde(with = "nan_as_null")]
    pub annualized_volatility: f64,
}

/// Regimes plus notes about change points that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeAnalysis {
    pub regimes: Vec<Regime>,
    pub warnings: Vec<String>,
}

/// Change in statistics between two adjacent regimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTransition {
    pub from: usize,
    pub to: usize,
    pub date: NaiveDate,
    #[serde(with = "nan_as_null")]
    pub mean_change: f64,
    #[serde(with = "nan_as_null")]
    pub std_change: f64,
    /// Percentage points.
    #[serde(with = "nan_as_null")]
    pub annualized_volatility_change: f64,
}

/// Partition `returns` at `change_points` and describe each regime.
///
/// Indices at 0, at or past the end, duplicated or out of order are skipped
/// with a warning.
///
/// # Errors
/// `EmptySeries` when `returns` is empty.
pub fn quantify_regimes(returns: &ReturnSeries, change_points: &[usize]) -> Result<RegimeAnalysis> {
    let n = returns.len();
    let Some(series_end) = returns.end() else {
        return Err(RegimeError::EmptySeries);
    };

    let mut warnings = Vec::new();
    let mut boundaries = vec![0];
    for &cp in change_points {
        let previous = boundaries[boundaries.len() - 1];
        if cp == 0 || cp >= n || cp <= previous {
            let note = format!("skipped change point at index {cp}: not inside (previous {previous}, {n})");
            warn!("{note}");
            warnings.push(note);
            continue;
        }
        boundaries.push(cp);
    }
    boundaries.push(n);

    let values = returns.values();
    let dates = returns.dates();
    let regimes = boundaries
        .windows(2)
        .enumerate()
        .map(|(ordinal, w)| {
            let (start, end) = (w[0], w[1]);
            let start_date = dates[start];
            let end_date = if end == n { series_end } else { dates[end] };
            let segment = &values[start..end];
            let return_std = std_dev_or_zero(segment);
            Regime {
                ordinal,
                start_index: start,
                end_index: end,
                start_date,
                end_date,
                duration_days: (end_date - start_date).num_days(),
                observations: end - start,
                mean_return: mean(segment),
                return_std,
                annualized_volatility: annualized_volatility(return_std),
            }
        })
        .collect();

    Ok(RegimeAnalysis { regimes, warnings })
}

/// Deltas between each pair of adjacent regimes.
pub fn transitions(regimes: &[Regime]) -> Vec<RegimeTransition> {
    regimes
        .windows(2)
        .map(|w| RegimeTransition {
            from: w[0].ordinal,
            to: w[1].ordinal,
            date: w[1].start_date,
            mean_change: w[1].mean_return - w[0].mean_return,
            std_change: w[1].return_std - w[0].return_std,
            annualized_volatility_change: w[1].annualized_volatility - w[0].annualized_volatility,
        })
        .collect()
}
