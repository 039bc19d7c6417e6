//! Cost functions for changepoint detection.
//!
//! Cost functions evaluate the "cost" of fitting a model to a segment of data.
//! Lower cost indicates a better fit. The segmentation algorithms query many
//! overlapping segments, so every cost here is precomputed into prefix sums
//! and answers `cost(start, end)` in constant time (or `O(D)` for the kernel
//! cost).

use crate::error::{RegimeError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// A segment cost over a fixed series, evaluated on half-open `[start, end)`.
pub trait SegmentCost {
    /// Length of the underlying series.
    fn n_samples(&self) -> usize;

    /// Cost of `series[start..end]`. Empty segments cost zero.
    fn cost(&self, start: usize, end: usize) -> f64;
}

/// Running sums of a series and its squares.
#[derive(Debug, Clone)]
pub struct PrefixSums {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PrefixSums {
    pub fn new(series: &[f64]) -> Self {
        let mut sum = Vec::with_capacity(series.len() + 1);
        let mut sum_sq = Vec::with_capacity(series.len() + 1);
        sum.push(0.0);
        sum_sq.push(0.0);
        let (mut s, mut s2) = (0.0, 0.0);
        for &x in series {
            s += x;
            s2 += x * x;
            sum.push(s);
            sum_sq.push(s2);
        }
        Self { sum, sum_sq }
    }

    pub fn len(&self) -> usize {
        self.sum.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Σ x` over `[start, end)`.
    #[inline]
    pub fn sum(&self, start: usize, end: usize) -> f64 {
        self.sum[end] - self.sum[start]
    }

    /// `Σ x²` over `[start, end)`.
    #[inline]
    pub fn sum_sq(&self, start: usize, end: usize) -> f64 {
        self.sum_sq[end] - self.sum_sq[start]
    }

    /// Sum of squared deviations from the segment mean.
    #[inline]
    pub fn squared_deviation(&self, start: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        if n == 0.0 {
            return 0.0;
        }
        let s = self.sum(start, end);
        (self.sum_sq(start, end) - s * s / n).max(0.0)
    }
}

/// L2 cost: sum of squared deviations from mean.
///
/// Also known as residual sum of squares (RSS).
pub fn l2_cost(segment: &[f64]) -> f64 {
    if segment.is_empty() {
        return 0.0;
    }

    let mean = segment.iter().sum::<f64>() / segment.len() as f64;
    segment.iter().map(|x| (x - mean).powi(2)).sum()
}

/// Normal (Gaussian) cost: negative log-likelihood assuming constant mean and variance.
///
/// Cost = n * log(variance) (ignoring constant terms)
pub fn normal_cost(segment: &[f64]) -> f64 {
    let n = segment.len();
    if n < 2 {
        return 0.0;
    }
    normal_from_rss(l2_cost(segment), n)
}

#[inline]
fn normal_from_rss(rss: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let variance = rss / n as f64;
    if variance < 1e-10 {
        return 0.0; // Constant segment
    }
    n as f64 * variance.ln()
}

/// Precomputed L2 cost.
#[derive(Debug, Clone)]
pub struct L2Cost {
    sums: PrefixSums,
}

impl L2Cost {
    pub fn new(series: &[f64]) -> Self {
        Self {
            sums: PrefixSums::new(series),
        }
    }
}

impl SegmentCost for L2Cost {
    fn n_samples(&self) -> usize {
        self.sums.len()
    }

    fn cost(&self, start: usize, end: usize) -> f64 {
        self.sums.squared_deviation(start, end)
    }
}

/// Precomputed Gaussian cost `n ln σ²`, sensitive to variance shifts.
#[derive(Debug, Clone)]
pub struct NormalCost {
    sums: PrefixSums,
}

impl NormalCost {
    pub fn new(series: &[f64]) -> Self {
        Self {
            sums: PrefixSums::new(series),
        }
    }
}

impl SegmentCost for NormalCost {
    fn n_samples(&self) -> usize {
        self.sums.len()
    }

    fn cost(&self, start: usize, end: usize) -> f64 {
        normal_from_rss(self.sums.squared_deviation(start, end), end - start)
    }
}

/// RBF bandwidth heuristic `1 / median(pairwise squared distance)`.
///
/// Pairwise distances are never materialized: the two middle order
/// statistics are found by bisection on the distance, counting pairs within
/// it over the sorted values. A zero median falls back to `1.0`.
pub fn rbf_gamma_heuristic(series: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n < 2 {
        return 1.0;
    }

    let pairs = n * (n - 1) / 2;
    let lower = pair_distance_rank(&sorted, (pairs - 1) / 2);
    let upper = pair_distance_rank(&sorted, pairs / 2);
    let median = (lower * lower + upper * upper) / 2.0;
    if median.is_finite() && median > 0.0 {
        1.0 / median
    } else {
        1.0
    }
}

/// Number of pairs `i < j` with `sorted[j] - sorted[i] <= d`.
fn pairs_within(sorted: &[f64], d: f64) -> usize {
    let mut count = 0;
    let mut i = 0;
    for j in 0..sorted.len() {
        while sorted[j] - sorted[i] > d {
            i += 1;
        }
        count += j - i;
    }
    count
}

/// The `k`-th smallest (0-based) pairwise absolute difference.
fn pair_distance_rank(sorted: &[f64], k: usize) -> f64 {
    let mut lo = 0.0;
    let mut hi = sorted[sorted.len() - 1] - sorted[0];
    if pairs_within(sorted, lo) > k {
        return 0.0;
    }
    // count(lo) <= k < count(hi)
    for _ in 0..200 {
        let mid = lo + (hi - lo) / 2.0;
        if mid <= lo || mid >= hi {
            break;
        }
        if pairs_within(sorted, mid) > k {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}

/// Kernel cost with an RBF kernel `exp(-γ (x - y)²)`.
///
/// The kernel is approximated by `D` random Fourier features
/// `φ(x) = sqrt(2/D) cos(w x + b)` with `w ~ N(0, 2γ)` and `b ~ U[0, 2π)`,
/// turning the kernel cost into an L2 cost in feature space:
/// `Σ ||φ(x_i)||² - ||Σ φ(x_i)||² / m`.
#[derive(Debug, Clone)]
pub struct KernelCost {
    n: usize,
    n_features: usize,
    gamma: f64,
    /// Row-major prefix sums, `(n + 1) * n_features`.
    feature_sums: Vec<f64>,
    norm_sums: Vec<f64>,
}

impl KernelCost {
    /// Build the feature embedding of `series`.
    ///
    /// # Errors
    /// `InvalidParameter` for zero features or a non-positive bandwidth.
    pub fn new(series: &[f64], n_features: usize, gamma: Option<f64>, seed: u64) -> Result<Self> {
        if n_features == 0 {
            return Err(RegimeError::InvalidParameter(
                "kernel cost needs at least one feature".to_string(),
            ));
        }
        let gamma = gamma.unwrap_or_else(|| rbf_gamma_heuristic(series));
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(RegimeError::InvalidParameter(format!(
                "RBF gamma must be finite and > 0; got {gamma}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let frequency = Normal::new(0.0, (2.0 * gamma).sqrt())
            .map_err(|e| RegimeError::InvalidParameter(format!("RBF frequency: {e}")))?;
        let weights: Vec<f64> = (0..n_features).map(|_| frequency.sample(&mut rng)).collect();
        let phases: Vec<f64> = (0..n_features)
            .map(|_| rng.gen_range(0.0..2.0 * PI))
            .collect();
        let scale = (2.0 / n_features as f64).sqrt();

        let n = series.len();
        let mut feature_sums = vec![0.0; (n + 1) * n_features];
        let mut norm_sums = vec![0.0; n + 1];

        for (i, &x) in series.iter().enumerate() {
            let (prev, next) = feature_sums.split_at_mut((i + 1) * n_features);
            let prev = &prev[i * n_features..];
            let next = &mut next[..n_features];
            let mut norm = 0.0;
            for j in 0..n_features {
                let phi = scale * (weights[j] * x + phases[j]).cos();
                next[j] = prev[j] + phi;
                norm += phi * phi;
            }
            norm_sums[i + 1] = norm_sums[i] + norm;
        }

        Ok(Self {
            n,
            n_features,
            gamma,
            feature_sums,
            norm_sums,
        })
    }

    /// Bandwidth in use.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl SegmentCost for KernelCost {
    fn n_samples(&self) -> usize {
        self.n
    }

    fn cost(&self, start: usize, end: usize) -> f64 {
        let m = end - start;
        if m == 0 {
            return 0.0;
        }
        let d = self.n_features;
        let lo = &self.feature_sums[start * d..(start + 1) * d];
        let hi = &self.feature_sums[end * d..(end + 1) * d];
        let centroid_sq: f64 = hi.iter().zip(lo).map(|(h, l)| (h - l) * (h - l)).sum();
        let diag = self.norm_sums[end] - self.norm_sums[start];
        (diag - centroid_sq / m as f64).max(0.0)
    }
}
