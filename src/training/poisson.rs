//! Poisson regression (log-link GLM) fitted by IRLS
//!
//! The natural model for the hit counts: E[y | x] = exp(w · x + b). Fitting
//! runs iteratively reweighted least squares, solving a weighted normal
//! system per iteration with the shared Cholesky solver.

use super::config::{ModelKind, PoissonConfig};
use super::linear::{cholesky_solve, matrix_inverse, with_intercept_column};
use super::{check_fit_shapes, FitBudget, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

// Caps exp() inputs so early iterations cannot overflow the weights.
const MAX_LINEAR_PREDICTOR: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoissonRegression {
    config: PoissonConfig,
    /// Weights including the trailing intercept term
    weights: Option<Array1<f64>>,
    diagnostics: FitDiagnostics,
    is_fitted: bool,
}

impl PoissonRegression {
    pub fn new(config: PoissonConfig) -> Self {
        Self {
            config,
            weights: None,
            diagnostics: FitDiagnostics {
                converged: false,
                iterations: 0,
            },
            is_fitted: false,
        }
    }

    fn linear_predictor(weights: &Array1<f64>, x: &Array2<f64>) -> Array1<f64> {
        with_intercept_column(x)
            .dot(weights)
            .mapv(|eta| eta.clamp(-MAX_LINEAR_PREDICTOR, MAX_LINEAR_PREDICTOR))
    }
}

impl Regressor for PoissonRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        if y.iter().any(|&v| v < 0.0) {
            return Err(ListingError::Training(
                "poisson regression requires non-negative targets".to_string(),
            ));
        }

        let budget = FitBudget::new(self.config.max_fit_secs);
        let xa = with_intercept_column(x);
        let p = xa.ncols();
        let mut weights: Array1<f64> = Array1::zeros(p);
        // Start the intercept at log(mean(y)) so mu begins near the data.
        let mean_y = y.mean().unwrap_or(0.0).max(1e-8);
        weights[p - 1] = mean_y.ln();

        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.config.max_iter {
            budget.check(iter)?;
            iterations = iter + 1;

            let eta = Self::linear_predictor(&weights, x);
            let mu = eta.mapv(f64::exp);

            // Working response z = eta + (y - mu) / mu, weighted by mu.
            // The weighted normal system is (X^T W X) delta = X^T W z.
            let mut xtwx = Array2::zeros((p, p));
            let mut xtwz = Array1::zeros(p);
            for i in 0..xa.nrows() {
                let w = mu[i].max(1e-10);
                let z = eta[i] + (y[i] - mu[i]) / w;
                for a in 0..p {
                    xtwz[a] += w * xa[[i, a]] * z;
                    for b in 0..p {
                        xtwx[[a, b]] += w * xa[[i, a]] * xa[[i, b]];
                    }
                }
            }

            let updated = match cholesky_solve(&xtwx, &xtwz) {
                Some(w) => w,
                None => {
                    let inv = matrix_inverse(&xtwx).ok_or_else(|| {
                        ListingError::Computation(
                            "singular weighted system in IRLS".to_string(),
                        )
                    })?;
                    inv.dot(&xtwz)
                }
            };

            let delta = (&updated - &weights).mapv(f64::abs).sum();
            weights = updated;
            if delta < self.config.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                iterations,
                "poisson IRLS hit the iteration cap without converging"
            );
        }

        self.weights = Some(weights);
        self.diagnostics = FitDiagnostics {
            converged,
            iterations,
        };
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.weights.as_ref().ok_or(ListingError::ModelNotFitted)?;
        if x.ncols() + 1 != weights.len() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", weights.len() - 1),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(Self::linear_predictor(weights, x).mapv(f64::exp))
    }

    fn diagnostics(&self) -> FitDiagnostics {
        self.diagnostics
    }

    fn kind(&self) -> ModelKind {
        ModelKind::PoissonGlm
    }
}
