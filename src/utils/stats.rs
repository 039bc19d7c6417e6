//! Statistical utility functions.

use super::nan_as_null;
use serde::{Deserialize, Serialize};

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sample standard deviation that degrades gracefully on tiny inputs.
///
/// One observation has no spread, so this returns `0.0` instead of NaN.
/// An empty slice still yields NaN.
pub fn std_dev_or_zero(values: &[f64]) -> f64 {
    match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        _ => std_dev(values),
    }
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Skewness (adjusted Fisher-Pearson standardized moment coefficient).
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let m = mean(values);
    let s = std_dev(values);

    if s < 1e-12 {
        return 0.0;
    }

    let sum_cubed: f64 = values.iter().map(|x| ((x - m) / s).powi(3)).sum();
    (n / ((n - 1.0) * (n - 2.0))) * sum_cubed
}

/// Excess kurtosis (normal distribution = 0).
pub fn kurtosis(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let m = mean(values);
    let s = std_dev(values);

    if s < 1e-12 {
        return f64::NAN;
    }

    let sum_fourth: f64 = values.iter().map(|x| ((x - m) / s).powi(4)).sum();
    let k = (n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0))) * sum_fourth;
    k - (3.0 * (n - 1.0).powi(2)) / ((n - 2.0) * (n - 3.0))
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Trailing rolling sample standard deviation.
///
/// Positions before the first full window are NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        result[i] = std_dev(&values[i + 1 - window..=i]);
    }
    result
}

/// Descriptive statistics of a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub count: usize,
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    #[serde(with = "nan_as_null")]
    pub median: f64,
    #[serde(with = "nan_as_null")]
    pub min: f64,
    #[serde(with = "nan_as_null")]
    pub max: f64,
    #[serde(with = "nan_as_null")]
    pub std: f64,
    #[serde(with = "nan_as_null")]
    pub skewness: f64,
    #[serde(with = "nan_as_null")]
    pub kurtosis: f64,
}

impl SeriesSummary {
    /// Summarize a slice. Statistics undefined for the input length are NaN.
    pub fn of(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            count: values.len(),
            mean: mean(values),
            median: median(values),
            min: if values.is_empty() { f64::NAN } else { min },
            max: if values.is_empty() { f64::NAN } else { max },
            std: std_dev(values),
            skewness: skewness(values),
            kurtosis: kurtosis(values),
        }
    }
}
