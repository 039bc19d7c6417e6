//! Ordinary Least Squares (OLS) regression for unit-root testing.
//!
//! The augmented Dickey-Fuller test regresses the differenced series on an
//! intercept, the lagged level and lagged differences; it needs the standard
//! error of one coefficient, which this module provides.

use crate::error::{RegimeError, Result};

/// Fitted OLS regression `y = intercept + X @ coefficients`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Intercept term.
    pub intercept: f64,
    /// Regression coefficients (one per regressor column).
    pub coefficients: Vec<f64>,
    /// Standard errors, intercept first, then one per coefficient.
    pub standard_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations used.
    pub n_obs: usize,
}

impl OLSResult {
    /// Number of estimated parameters (intercept included).
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    /// t-statistic of regressor `index` (0-based, intercept excluded).
    pub fn t_stat(&self, index: usize) -> Option<f64> {
        let coef = *self.coefficients.get(index)?;
        let se = *self.standard_errors.get(index + 1)?;
        if se > 0.0 && se.is_finite() {
            Some(coef / se)
        } else {
            None
        }
    }

    /// Akaike information criterion, `n ln(RSS/n) + 2k`.
    pub fn aic(&self) -> f64 {
        if self.rss <= 0.0 || self.n_obs == 0 {
            return f64::INFINITY;
        }
        let n = self.n_obs as f64;
        n * (self.rss / n).ln() + 2.0 * self.num_params() as f64
    }
}

/// Fit OLS with an intercept using Cholesky decomposition of the normal
/// equations.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `columns` - Regressor columns, each of length n
pub fn ols_fit(y: &[f64], columns: &[&[f64]]) -> Result<OLSResult> {
    let n = y.len();
    let k = columns.len();
    let num_params = k + 1;

    if n <= num_params {
        return Err(RegimeError::InsufficientData {
            needed: num_params + 1,
            got: n,
        });
    }

    for col in columns {
        if col.len() != n {
            return Err(RegimeError::InvalidParameter(format!(
                "regressor length {} does not match target length {}",
                col.len(),
                n
            )));
        }
    }

    // X'X and X'y with the intercept as column 0
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];
    let mut row = vec![1.0; num_params];

    for obs in 0..n {
        for j in 0..k {
            row[j + 1] = columns[j][obs];
        }
        for i in 0..num_params {
            xty[i] += row[i] * y[obs];
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..num_params {
        for j in (i + 1)..num_params {
            xtx[i][j] = xtx[j][i];
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        RegimeError::ComputationError("OLS design matrix is not positive definite".into())
    })?;
    let beta = cholesky_solve(&chol, &xty);

    let mut rss = 0.0;
    for obs in 0..n {
        let mut fitted = beta[0];
        for j in 0..k {
            fitted += beta[j + 1] * columns[j][obs];
        }
        let resid = y[obs] - fitted;
        rss += resid * resid;
    }

    let sigma_sq = rss / (n - num_params) as f64;

    // diag((X'X)^-1) via unit-vector solves
    let mut standard_errors = Vec::with_capacity(num_params);
    let mut unit = vec![0.0; num_params];
    for i in 0..num_params {
        unit.iter_mut().for_each(|u| *u = 0.0);
        unit[i] = 1.0;
        let inv_col = cholesky_solve(&chol, &unit);
        standard_errors.push((sigma_sq * inv_col[i]).max(0.0).sqrt());
    }

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        standard_errors,
        rss,
        n_obs: n,
    })
}

/// Cholesky factor `L` with `A = L L'`, or `None` when `A` is not positive
/// definite.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 1e-12 * a[i][i].abs().max(1.0) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ols_fit_simple_linear() {
        // y = 2 + 3*x
        let y = vec![5.0, 8.0, 11.0, 14.0, 17.0];
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let result = ols_fit(&y, &[&x]).unwrap();

        assert_relative_eq!(result.intercept, 2.0, epsilon = 1e-8);
        assert_eq!(result.coefficients.len(), 1);
        assert_relative_eq!(result.coefficients[0], 3.0, epsilon = 1e-8);
        assert!(result.rss < 1e-12);
    }

    #[test]
    fn ols_fit_multiple_regressors() {
        // y = 1 + 2*x1 + 3*x2
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 7.0];
        let y: Vec<f64> = x1
            .iter()
            .zip(x2.iter())
            .map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b)
            .collect();

        let result = ols_fit(&y, &[&x1, &x2]).unwrap();

        assert_relative_eq!(result.intercept, 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.coefficients[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(result.coefficients[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn standard_error_matches_closed_form() {
        // Simple regression: se(beta) = sqrt(sigma^2 / Sxx)
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![1.1, 1.9, 3.2, 3.8, 5.1, 6.2];

        let result = ols_fit(&y, &[&x]).unwrap();

        let x_mean = 3.5;
        let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
        let sigma_sq = result.rss / (y.len() - 2) as f64;
        assert_relative_eq!(
            result.standard_errors[1],
            (sigma_sq / sxx).sqrt(),
            epsilon = 1e-8
        );
        let t = result.t_stat(0).unwrap();
        assert_relative_eq!(t, result.coefficients[0] / result.standard_errors[1]);
    }

    #[test]
    fn collinear_design_is_rejected() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ols_fit(&y, &[&x, &x]);
        assert!(matches!(result, Err(RegimeError::ComputationError(_))));
    }

    #[test]
    fn too_few_observations() {
        let result = ols_fit(&[1.0, 2.0], &[&[1.0, 2.0]]);
        assert!(matches!(
            result,
            Err(RegimeError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let result = ols_fit(&[1.0, 2.0, 3.0, 4.0], &[&[1.0, 2.0]]);
        assert!(matches!(result, Err(RegimeError::InvalidParameter(_))));
    }
}
