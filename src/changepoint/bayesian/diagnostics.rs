//! Posterior summaries and convergence diagnostics for MCMC traces.

use crate::utils::{mean, variance};

/// Split R-hat (Gelman et al., BDA3) of one scalar parameter.
///
/// Each chain is split into halves (the middle draw of an odd-length chain is
/// dropped), and the between/within variance ratio is computed over the
/// halves. Traces that are constant everywhere give `1.0`; traces constant
/// within chains but different across them give infinity. Fewer than two
/// draws per half gives NaN.
pub fn split_rhat(chains: &[Vec<f64>]) -> f64 {
    let Some(n) = chains.iter().map(Vec::len).min() else {
        return f64::NAN;
    };
    let half = n / 2;
    if half < 2 {
        return f64::NAN;
    }

    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        let chain = &chain[..n];
        halves.push(&chain[..half]);
        halves.push(&chain[n - half..]);
    }

    let means: Vec<f64> = halves.iter().map(|h| mean(h)).collect();
    let within = mean(&halves.iter().map(|h| variance(h)).collect::<Vec<_>>());
    let between = half as f64 * variance(&means);

    if within <= 0.0 {
        return if between <= 0.0 { 1.0 } else { f64::INFINITY };
    }

    let half = half as f64;
    let var_plus = (half - 1.0) / half * within + between / half;
    (var_plus / within).sqrt()
}

/// Highest-density interval of `samples` holding `prob` of the mass.
///
/// Returns the narrowest window over the sorted samples that spans
/// `floor(prob * n)` steps; ties go to the lowest window.
pub fn hdi(samples: &[f64], prob: f64) -> Option<(f64, f64)> {
    if samples.is_empty() || !(prob > 0.0 && prob <= 1.0) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let width = ((prob * n as f64).floor() as usize).min(n - 1);

    let (lower, _) = (0..n - width)
        .map(|i| (i, sorted[i + width] - sorted[i]))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

    Some((sorted[lower], sorted[lower + width]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rhat_of_identical_chains_is_near_one() {
        let chain: Vec<f64> = (0..200).map(|i| ((i * 31) % 17) as f64).collect();
        let rhat = split_rhat(&[chain.clone(), chain.clone(), chain]);
        assert!(rhat < 1.05, "rhat = {rhat}");
    }

    #[test]
    fn rhat_detects_disagreeing_chains() {
        let a: Vec<f64> = (0..200).map(|i| ((i * 31) % 17) as f64).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 50.0).collect();
        assert!(split_rhat(&[a, b]) > 1.1);
    }

    #[test]
    fn rhat_detects_drift_within_one_chain() {
        let drifting: Vec<f64> = (0..200).map(|i| i as f64).collect();
        assert!(split_rhat(&[drifting]) > 1.1);
    }

    #[test]
    fn rhat_constant_traces() {
        assert_eq!(split_rhat(&[vec![5.0; 10], vec![5.0; 10]]), 1.0);
        assert_eq!(split_rhat(&[vec![5.0; 10], vec![6.0; 10]]), f64::INFINITY);
        assert!(split_rhat(&[vec![1.0, 2.0, 3.0]]).is_nan());
        assert!(split_rhat(&[]).is_nan());
    }

    #[test]
    fn hdi_of_uniform_grid() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (lo, hi) = hdi(&samples, 0.9).unwrap();
        assert_relative_eq!(hi - lo, 90.0);
        assert_relative_eq!(lo, 0.0);
    }

    #[test]
    fn hdi_picks_the_dense_region() {
        let mut samples = vec![10.0; 95];
        samples.extend([0.0, 1.0, 50.0, 60.0, 70.0]);
        let (lo, hi) = hdi(&samples, 0.9).unwrap();
        assert_eq!((lo, hi), (10.0, 10.0));
    }

    #[test]
    fn hdi_rejects_bad_input() {
        assert!(hdi(&[], 0.95).is_none());
        assert!(hdi(&[1.0], 0.0).is_none());
        assert_eq!(hdi(&[3.0], 0.95), Some((3.0, 3.0)));
    }
}
