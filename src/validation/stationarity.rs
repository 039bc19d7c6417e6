//! Stationarity tests for time series.
//!
//! Provides the augmented Dickey-Fuller unit-root test and the KPSS
//! level-stationarity test. Both are advisory: a test that cannot be computed
//! reports [`TestConclusion::Inconclusive`] instead of failing.

use crate::utils::{nan_as_null, ols_fit};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Significance level used for every conclusion.
pub const SIGNIFICANCE: f64 = 0.05;

/// Outcome of a single test at the 5% level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestConclusion {
    Stationary,
    NonStationary,
    Inconclusive,
}

impl std::fmt::Display for TestConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TestConclusion::Stationary => "stationary",
            TestConclusion::NonStationary => "non-stationary",
            TestConclusion::Inconclusive => "inconclusive",
        };
        f.write_str(label)
    }
}

/// Result of a stationarity test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationarityResult {
    /// Test statistic
    #[serde(with = "nan_as_null")]
    pub statistic: f64,
    /// P-value (approximate)
    #[serde(with = "nan_as_null")]
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Conclusion at the 5% level
    pub conclusion: TestConclusion,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

impl StationarityResult {
    fn inconclusive(lags: usize, critical_values: CriticalValues) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            conclusion: TestConclusion::Inconclusive,
            critical_values,
        }
    }

    /// Whether the test could be computed.
    pub fn is_conclusive(&self) -> bool {
        self.conclusion != TestConclusion::Inconclusive
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// MacKinnon asymptotic critical values, constant but no trend.
pub const ADF_CRITICAL_VALUES: CriticalValues = CriticalValues {
    cv_1pct: -3.43,
    cv_5pct: -2.86,
    cv_10pct: -2.57,
};

/// Kwiatkowski et al. critical values for level stationarity.
pub const KPSS_CRITICAL_VALUES: CriticalValues = CriticalValues {
    cv_1pct: 0.739,
    cv_5pct: 0.463,
    cv_10pct: 0.347,
};

/// Augmented Dickey-Fuller test for a unit root.
///
/// Null hypothesis: the series has a unit root (non-stationary). The
/// regression is `Δy_t = α + β y_{t-1} + Σ γ_i Δy_{t-i} + ε_t` with the lag
/// order chosen by AIC over a common sample.
///
/// # Arguments
/// * `series` - Time series data
/// * `max_lags` - Maximum lags to consider (default: `floor((n-1)^(1/3))`)
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 8 || series.iter().any(|v| !v.is_finite()) {
        return StationarityResult::inconclusive(0, ADF_CRITICAL_VALUES);
    }

    let max_lags = max_lags.unwrap_or_else(|| ((n - 1) as f64).powf(1.0 / 3.0).floor() as usize);
    let max_lags = max_lags.min(n / 2 - 3);

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    // Lag selection on the common sample that starts after max_lags
    let mut best_lag = 0;
    let mut best_aic = f64::INFINITY;
    for lag in 0..=max_lags {
        if let Some(aic) = adf_regression(series, &diff, lag, max_lags).map(|r| r.aic()) {
            if aic < best_aic {
                best_aic = aic;
                best_lag = lag;
            }
        }
    }

    let t_stat = adf_regression(series, &diff, best_lag, best_lag).and_then(|r| r.t_stat(0));

    let Some(t_stat) = t_stat.filter(|t| t.is_finite()) else {
        return StationarityResult::inconclusive(best_lag, ADF_CRITICAL_VALUES);
    };

    let conclusion = if t_stat < ADF_CRITICAL_VALUES.cv_5pct {
        TestConclusion::Stationary
    } else {
        TestConclusion::NonStationary
    };

    StationarityResult {
        statistic: t_stat,
        p_value: adf_p_value(t_stat),
        lags: best_lag,
        conclusion,
        critical_values: ADF_CRITICAL_VALUES,
    }
}

/// Fit the ADF regression with `lag` lagged differences, dropping the first
/// `skip` differences so that regressions with different lags share a sample.
fn adf_regression(
    level: &[f64],
    diff: &[f64],
    lag: usize,
    skip: usize,
) -> Option<crate::utils::OLSResult> {
    let start = skip.max(lag);
    if diff.len() <= start + lag + 3 {
        return None;
    }

    let y = &diff[start..];
    let lagged_level = &level[start..level.len() - 1];

    let lagged_diffs: Vec<Vec<f64>> = (1..=lag)
        .map(|i| diff[start - i..diff.len() - i].to_vec())
        .collect();

    let mut columns: Vec<&[f64]> = Vec::with_capacity(lag + 1);
    columns.push(lagged_level);
    columns.extend(lagged_diffs.iter().map(|c| c.as_slice()));

    ols_fit(y, &columns).ok()
}

/// MacKinnon (1994) approximate p-value for the constant-only tau statistic.
fn adf_p_value(t_stat: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
    const LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

    if t_stat > TAU_MAX {
        return 1.0;
    }
    if t_stat < TAU_MIN {
        return 0.0;
    }

    let coefs: &[f64] = if t_stat <= TAU_STAR { &SMALL_P } else { &LARGE_P };
    let z = coefs
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * t_stat + c);

    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => f64::NAN,
    }
}

/// KPSS test for level stationarity.
///
/// Null hypothesis: the series is level stationary. Rejection implies
/// non-stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Number of lags for HAC variance (default: `floor(4 (n/100)^0.25)`)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 4 || series.iter().any(|v| !v.is_finite()) {
        return StationarityResult::inconclusive(0, KPSS_CRITICAL_VALUES);
    }

    let lags = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);
    let lags = lags.min(n / 2).max(1);

    let mean: f64 = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let mut cumsum = 0.0;
    let numerator: f64 = residuals
        .iter()
        .map(|&r| {
            cumsum += r;
            cumsum * cumsum
        })
        .sum::<f64>()
        / (n as f64 * n as f64);

    // HAC variance estimator (Bartlett kernel)
    let mut variance = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocovar: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        variance += 2.0 * weight * autocovar;
    }

    if variance <= 1e-300 {
        return StationarityResult::inconclusive(lags, KPSS_CRITICAL_VALUES);
    }

    let stat = numerator / variance;

    let conclusion = if stat < KPSS_CRITICAL_VALUES.cv_5pct {
        TestConclusion::Stationary
    } else {
        TestConclusion::NonStationary
    };

    StationarityResult {
        statistic: stat,
        p_value: kpss_p_value(stat),
        lags,
        conclusion,
        critical_values: KPSS_CRITICAL_VALUES,
    }
}

/// Interpolated KPSS p-value, clipped to the tabulated range [0.01, 0.10].
fn kpss_p_value(stat: f64) -> f64 {
    const STATS: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
    const PVALS: [f64; 4] = [0.10, 0.05, 0.025, 0.01];

    if stat <= STATS[0] {
        return PVALS[0];
    }
    if stat >= STATS[3] {
        return PVALS[3];
    }
    for i in 0..3 {
        if stat <= STATS[i + 1] {
            let frac = (stat - STATS[i]) / (STATS[i + 1] - STATS[i]);
            return PVALS[i] + frac * (PVALS[i + 1] - PVALS[i]);
        }
    }
    PVALS[3]
}

/// Combined ADF + KPSS assessment of one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationarityReport {
    pub adf: StationarityResult,
    pub kpss: StationarityResult,
    pub verdict: TestConclusion,
}

/// Run both tests and combine them.
///
/// The verdict is `Stationary` when ADF rejects a unit root and KPSS fails to
/// reject stationarity, `NonStationary` when both point the other way, and
/// `Inconclusive` otherwise (including when either test could not run).
pub fn test_stationarity(series: &[f64]) -> StationarityReport {
    let adf = adf_test(series, None);
    let kpss = kpss_test(series, None);

    let verdict = match (adf.conclusion, kpss.conclusion) {
        (TestConclusion::Stationary, TestConclusion::Stationary) => TestConclusion::Stationary,
        (TestConclusion::NonStationary, TestConclusion::NonStationary) => {
            TestConclusion::NonStationary
        }
        _ => TestConclusion::Inconclusive,
    };

    StationarityReport { adf, kpss, verdict }
}

/// Diagnostics comparing price space with return space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstrateDiagnostics {
    pub prices: StationarityReport,
    pub log_returns: StationarityReport,
}

impl SubstrateDiagnostics {
    /// Test both the price levels and their log returns.
    pub fn assess(prices: &[f64], log_returns: &[f64]) -> Self {
        Self {
            prices: test_stationarity(prices),
            log_returns: test_stationarity(log_returns),
        }
    }

    /// Whether the evidence favours modelling returns rather than prices.
    pub fn favours_returns(&self) -> bool {
        self.log_returns.verdict == TestConclusion::Stationary
            && self.prices.verdict != TestConclusion::Stationary
    }
}
