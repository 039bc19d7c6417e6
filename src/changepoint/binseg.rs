//! Binary segmentation with a fixed break budget.
//!
//! Greedily splits the segment whose best split lowers the total cost the
//! most, until the requested number of breaks is reached or no admissible
//! split improves the cost.

use super::cost::SegmentCost;

/// Configuration for binary segmentation.
#[derive(Debug, Clone)]
pub struct BinsegConfig {
    /// Maximum number of breaks to place
    pub n_breaks: usize,
    /// Minimum segment length
    pub min_segment_length: usize,
    /// Candidate breakpoints are multiples of `jump`
    pub jump: usize,
}

impl Default for BinsegConfig {
    fn default() -> Self {
        Self {
            n_breaks: 1,
            min_segment_length: 2,
            jump: 1,
        }
    }
}

impl BinsegConfig {
    pub fn n_breaks(mut self, n_breaks: usize) -> Self {
        self.n_breaks = n_breaks;
        self
    }

    pub fn min_segment_length(mut self, min_len: usize) -> Self {
        self.min_segment_length = min_len.max(1);
        self
    }

    pub fn jump(mut self, jump: usize) -> Self {
        self.jump = jump.max(1);
        self
    }
}

/// Result of binary segmentation.
#[derive(Debug, Clone)]
pub struct BinsegResult {
    /// Sorted break indices
    pub changepoints: Vec<usize>,
    /// Cost reduction of each break, in the order breaks were placed
    pub gains: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    at: usize,
    gain: f64,
}

fn best_split<C: SegmentCost + ?Sized>(
    cost: &C,
    start: usize,
    end: usize,
    config: &BinsegConfig,
) -> Option<Split> {
    let min_len = config.min_segment_length.max(1);
    let jump = config.jump.max(1);
    if end - start < 2 * min_len {
        return None;
    }

    let whole = cost.cost(start, end);
    let first = (start + min_len).div_ceil(jump) * jump;

    let mut best: Option<Split> = None;
    let mut t = first;
    while t + min_len <= end {
        let gain = whole - cost.cost(start, t) - cost.cost(t, end);
        if best.map_or(true, |b| gain > b.gain) {
            best = Some(Split { at: t, gain });
        }
        t += jump;
    }
    best.filter(|b| b.gain > 0.0)
}

/// Detect up to `n_breaks` changepoints by binary segmentation.
pub fn binseg_detect<C: SegmentCost + ?Sized>(cost: &C, config: &BinsegConfig) -> BinsegResult {
    let n = cost.n_samples();
    let mut segments: Vec<(usize, usize, Option<Split>)> = vec![(0, n, best_split(cost, 0, n, config))];
    let mut changepoints = Vec::new();
    let mut gains = Vec::new();

    while changepoints.len() < config.n_breaks {
        let chosen = segments
            .iter()
            .enumerate()
            .filter_map(|(i, &(_, _, split))| split.map(|s| (i, s)))
            .fold(None, |best: Option<(usize, Split)>, (i, s)| match best {
                Some((_, b)) if b.gain >= s.gain => best,
                _ => Some((i, s)),
            });

        let Some((index, split)) = chosen else {
            break;
        };

        let (start, end, _) = segments.swap_remove(index);
        segments.push((start, split.at, best_split(cost, start, split.at, config)));
        segments.push((split.at, end, best_split(cost, split.at, end, config)));
        changepoints.push(split.at);
        gains.push(split.gain);
    }

    changepoints.sort_unstable();
    BinsegResult {
        changepoints,
        gains,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changepoint::cost::{L2Cost, NormalCost};

    fn alternating(n: usize, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn finds_single_variance_shift() {
        let mut series = alternating(100, 0.1);
        series.extend(alternating(100, 2.0));

        let config = BinsegConfig::default().n_breaks(1).min_segment_length(10);
        let result = binseg_detect(&NormalCost::new(&series), &config);

        assert_eq!(result.changepoints, vec![100]);
        assert!(result.gains[0] > 0.0);
    }

    #[test]
    fn finds_two_variance_shifts_in_order() {
        let mut series = alternating(80, 0.1);
        series.extend(alternating(80, 3.0));
        series.extend(alternating(80, 0.5));

        let config = BinsegConfig::default().n_breaks(2).min_segment_length(10);
        let result = binseg_detect(&NormalCost::new(&series), &config);

        assert_eq!(result.changepoints, vec![80, 160]);
        assert_eq!(result.gains.len(), 2);
    }

    #[test]
    fn stops_when_no_split_helps() {
        let series = vec![1.0; 100];
        let config = BinsegConfig::default().n_breaks(3);
        let result = binseg_detect(&L2Cost::new(&series), &config);

        assert!(result.changepoints.is_empty());
    }

    #[test]
    fn respects_min_length_and_grid() {
        let mut series = vec![0.0; 33];
        series.extend(vec![5.0; 67]);

        let config = BinsegConfig::default()
            .n_breaks(1)
            .min_segment_length(20)
            .jump(10);
        let result = binseg_detect(&L2Cost::new(&series), &config);

        assert_eq!(result.changepoints.len(), 1);
        assert_eq!(result.changepoints[0] % 10, 0);
        assert!(result.changepoints[0] >= 20 && result.changepoints[0] <= 80);
    }

    #[test]
    fn short_series_has_no_breaks() {
        let config = BinsegConfig::default().n_breaks(2).min_segment_length(10);
        let result = binseg_detect(&L2Cost::new(&[1.0, 5.0, 1.0]), &config);
        assert!(result.changepoints.is_empty());
    }
}
