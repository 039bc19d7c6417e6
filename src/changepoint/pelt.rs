//! PELT (Pruned Exact Linear Time) algorithm for changepoint detection.
//!
//! An exact method for detecting multiple changepoints with O(n) average
//! complexity. Breakpoints are restricted to a grid of multiples of `jump`.

use super::cost::SegmentCost;

/// Configuration for PELT algorithm.
#[derive(Debug, Clone)]
pub struct PeltConfig {
    /// Penalty for each changepoint (controls number of changepoints)
    pub penalty: f64,
    /// Minimum segment length
    pub min_segment_length: usize,
    /// Candidate breakpoints are multiples of `jump`
    pub jump: usize,
}

impl Default for PeltConfig {
    fn default() -> Self {
        Self {
            penalty: 1.0,
            min_segment_length: 2,
            jump: 1,
        }
    }
}

impl PeltConfig {
    /// Set the penalty.
    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Set minimum segment length.
    pub fn min_segment_length(mut self, min_len: usize) -> Self {
        self.min_segment_length = min_len.max(1);
        self
    }

    /// Set the candidate grid spacing.
    pub fn jump(mut self, jump: usize) -> Self {
        self.jump = jump.max(1);
        self
    }
}

/// Result of PELT changepoint detection.
#[derive(Debug, Clone)]
pub struct PeltResult {
    /// Detected changepoint indices
    pub changepoints: Vec<usize>,
    /// Segment boundaries (start, end) pairs
    pub segments: Vec<(usize, usize)>,
    /// Total cost (excluding penalty)
    pub cost: f64,
    /// Number of changepoints
    pub n_changepoints: usize,
}

/// Optimal penalized segmentation of the series behind `cost`.
///
/// Minimizes `sum(cost(segment)) + penalty * breaks` over segmentations whose
/// segments are at least `min_segment_length` long and whose interior
/// breaks lie on multiples of `jump`. Candidates that can no longer start
/// the optimal last segment are pruned as the scan advances.
pub fn pelt_detect<C: SegmentCost + ?Sized>(cost: &C, config: &PeltConfig) -> PeltResult {
    let n = cost.n_samples();
    let min_len = config.min_segment_length.max(1);
    let jump = config.jump.max(1);

    if n < 2 * min_len {
        return PeltResult {
            changepoints: Vec::new(),
            segments: vec![(0, n)],
            cost: cost.cost(0, n),
            n_changepoints: 0,
        };
    }

    let mut ends: Vec<usize> = (jump..n).step_by(jump).collect();
    ends.push(n);

    // best[t]: optimal penalized cost of [0, t); the first segment is free.
    let mut best = vec![f64::INFINITY; n + 1];
    best[0] = -config.penalty;
    let mut last_break = vec![0usize; n + 1];
    let mut admissible: Vec<usize> = vec![0];

    for &t in &ends {
        let choice = admissible
            .iter()
            .filter(|&&s| t - s >= min_len)
            .map(|&s| (s, best[s] + cost.cost(s, t) + config.penalty))
            .fold(None, |acc: Option<(usize, f64)>, (s, total)| match acc {
                Some((_, b)) if b <= total => acc,
                _ => Some((s, total)),
            });
        let Some((s, total)) = choice.filter(|(_, total)| total.is_finite()) else {
            continue;
        };
        best[t] = total;
        last_break[t] = s;

        admissible.retain(|&s| t - s < min_len || best[s] + cost.cost(s, t) <= best[t]);
        admissible.push(t);
    }

    let mut changepoints = Vec::new();
    if best[n].is_finite() {
        let mut t = n;
        while t > 0 {
            t = last_break[t];
            if t > 0 {
                changepoints.push(t);
            }
        }
        changepoints.reverse();
    }

    let bounds: Vec<usize> = std::iter::once(0)
        .chain(changepoints.iter().copied())
        .chain(std::iter::once(n))
        .collect();
    let segments: Vec<(usize, usize)> = bounds.windows(2).map(|w| (w[0], w[1])).collect();
    let total_cost: f64 = segments.iter().map(|&(s, e)| cost.cost(s, e)).sum();

    PeltResult {
        n_changepoints: changepoints.len(),
        changepoints,
        segments,
        cost: total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changepoint::cost::{L2Cost, NormalCost};
    use approx::assert_relative_eq;

    fn detect_l2(series: &[f64], config: &PeltConfig) -> PeltResult {
        pelt_detect(&L2Cost::new(series), config)
    }

    #[test]
    fn flat_returns_have_no_break() {
        let series: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let result = detect_l2(&series, &PeltConfig::default().penalty(10.0));

        assert_eq!(result.n_changepoints, 0);
        assert_eq!(result.segments, vec![(0, 40)]);
    }

    #[test]
    fn level_shifts_are_located() {
        let mut series = vec![0.0; 10];
        series.extend(vec![10.0; 10]);
        series.extend(vec![0.0; 10]);

        let result = detect_l2(&series, &PeltConfig::default().penalty(2.0));

        assert_eq!(result.changepoints, vec![10, 20]);
        assert_eq!(result.segments, vec![(0, 10), (10, 20), (20, 30)]);
        assert_relative_eq!(result.cost, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn short_input_is_one_segment() {
        assert_eq!(detect_l2(&[1.0, 2.0, 3.0], &PeltConfig::default()).n_changepoints, 0);
        let empty = detect_l2(&[], &PeltConfig::default());
        assert!(empty.changepoints.is_empty());
        assert_eq!(empty.segments, vec![(0, 0)]);
    }

    #[test]
    fn large_penalty_suppresses_breaks() {
        let mut series = vec![0.0; 10];
        series.extend(vec![100.0; 10]);

        let result = detect_l2(&series, &PeltConfig::default().penalty(1e5));
        assert_eq!(result.n_changepoints, 0);
    }

    #[test]
    fn builder_clamps_to_one() {
        let config = PeltConfig::default()
            .penalty(5.0)
            .min_segment_length(0)
            .jump(0);

        assert_relative_eq!(config.penalty, 5.0);
        assert_eq!(config.min_segment_length, 1);
        assert_eq!(config.jump, 1);
    }

    #[test]
    fn breaks_respect_min_segment_length() {
        let mut series = vec![0.0; 2];
        series.extend(vec![100.0; 18]);

        let config = PeltConfig::default().penalty(1.0).min_segment_length(5);
        let result = detect_l2(&series, &config);

        assert!(result.changepoints.iter().all(|&cp| (5..=15).contains(&cp)));
    }

    #[test]
    fn pelt_jump_restricts_to_grid() {
        let mut series = vec![0.0; 23];
        series.extend(vec![10.0; 27]);

        // Off-grid shift at 23: a break at 25 costs 184, at 20 costs 270
        let config = PeltConfig::default()
            .penalty(50.0)
            .min_segment_length(10)
            .jump(5);
        let result = detect_l2(&series, &config);

        assert_eq!(result.changepoints, vec![25]);
    }

    #[test]
    fn pelt_normal_cost_detects_variance_change() {
        let mut series: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.1 } else { -0.1 }).collect();
        series.extend((0..60).map(|i| if i % 2 == 0 { 3.0 } else { -3.0 }));

        let config = PeltConfig::default().penalty(10.0).min_segment_length(10);
        let result = pelt_detect(&NormalCost::new(&series), &config);

        assert_eq!(result.changepoints, vec![60]);
    }
}
