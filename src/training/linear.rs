//! Ordinary least squares via the normal equations

use super::config::{ModelKind, OlsConfig};
use super::{check_fit_shapes, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Solve the symmetric positive-definite system Ax = b by Cholesky
/// decomposition, regularizing the diagonal and retrying once if A is not
/// positive definite.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    match cholesky_solve_inner(a, b) {
        Some(x) => Some(x),
        None => {
            let mut a_reg = a.clone();
            let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
            for k in 0..n {
                a_reg[[k, k]] += ridge;
            }
            cholesky_solve_inner(&a_reg, b)
        }
    }
}

fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    // A = L * L^T
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                // Near-zero pivots mean the system is numerically
                // semidefinite; bail out to the regularized retry.
                if diag <= 1e-12 * a[[i, i]].abs().max(1.0) {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan inverse for small matrices. Fallback when Cholesky fails.
pub(crate) fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // Augmented matrix [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        // Partial pivoting
        let mut pivot_row = col;
        let mut pivot_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > pivot_val {
                pivot_val = aug[[row, col]].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..2 * n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[pivot_row, j]];
                aug[[pivot_row, j]] = tmp;
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}

/// Solve the normal equations (X^T X) w = X^T y.
pub(crate) fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Ok(w);
    }
    let inv = matrix_inverse(&xtx).ok_or_else(|| {
        ListingError::Computation("normal equations are singular".to_string())
    })?;
    Ok(inv.dot(&xty))
}

/// Append an all-ones intercept column.
pub(crate) fn with_intercept_column(x: &Array2<f64>) -> Array2<f64> {
    let mut augmented = Array2::ones((x.nrows(), x.ncols() + 1));
    augmented
        .slice_mut(ndarray::s![.., ..x.ncols()])
        .assign(x);
    augmented
}

/// Ordinary least squares regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlsRegression {
    config: OlsConfig,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    is_fitted: bool,
}

impl OlsRegression {
    pub fn new(config: OlsConfig) -> Self {
        Self {
            config,
            coefficients: None,
            intercept: 0.0,
            is_fitted: false,
        }
    }

    /// Fitted per-feature slopes.
    pub fn coefficients(&self) -> Result<&Array1<f64>> {
        self.coefficients
            .as_ref()
            .ok_or(ListingError::ModelNotFitted)
    }

    /// Fitted intercept (0 when `fit_intercept` is false).
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for OlsRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        if self.config.fit_intercept {
            let augmented = with_intercept_column(x);
            let w = solve_least_squares(&augmented, y)?;
            self.intercept = w[x.ncols()];
            self.coefficients = Some(w.slice(ndarray::s![..x.ncols()]).to_owned());
        } else {
            self.intercept = 0.0;
            self.coefficients = Some(solve_least_squares(x, y)?);
        }
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coef = self.coefficients()?;
        if x.ncols() != coef.len() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", coef.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(x.dot(coef) + self.intercept)
    }

    fn diagnostics(&self) -> FitDiagnostics {
        FitDiagnostics::closed_form()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Ols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    #[test]
    fn test_recovers_known_line() {
        // y = 2x + 1
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0];

        let mut model = OlsRegression::new(OlsConfig::default());
        model.fit(&x, &y).unwrap();

        assert!((model.coefficients().unwrap()[0] - 2.0).abs() < 1e-8);
        assert!((model.intercept() - 1.0).abs() < 1e-8);
        assert!(model.diagnostics().converged);
    }

    #[test]
    fn test_no_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];

        let mut model = OlsRegression::new(OlsConfig {
            fit_intercept: false,
        });
        model.fit(&x, &y).unwrap();

        assert_eq!(model.intercept(), 0.0);
        assert!((model.coefficients().unwrap()[0] - 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = OlsRegression::new(OlsConfig::default());
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(ListingError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_cholesky_solves_spd_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![10.0, 8.0];
        let x = cholesky_solve(&a, &b).unwrap();
        // Check A x = b
        let r = a.dot(&x);
        assert!((r[0] - 10.0).abs() < 1e-10);
        assert!((r[1] - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_matrix_inverse_identity() {
        let m = array![[2.0, 0.0], [0.0, 4.0]];
        let inv = matrix_inverse(&m).unwrap();
        assert!((inv[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((inv[[1, 1]] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_multivariate_fit() {
        // y = 1*x0 + 3*x1 - 2
        let x = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [2.0, 3.0]
        ];
        let y = x.map_axis(Axis(1), |row| row[0] + 3.0 * row[1] - 2.0);

        let mut model = OlsRegression::new(OlsConfig::default());
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-8);
        }
    }
}
