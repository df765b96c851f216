//! Epsilon-insensitive support vector regression
//!
//! Dual coefficients (alpha − alpha*) are fitted by projected gradient
//! descent over a precomputed kernel matrix. Residuals inside the ε tube
//! contribute no gradient; the box constraint clips every coefficient to
//! [−C, C].

use super::config::{ModelKind, SvrConfig, SvrKernel};
use super::{check_fit_shapes, FitBudget, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this the O(n²) matrix would dominate memory.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

fn kernel(kind: SvrKernel, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    match kind {
        SvrKernel::Linear => a.dot(&b),
        SvrKernel::Rbf { gamma } => {
            let mut sq_dist = 0.0;
            for (ai, bi) in a.iter().zip(b.iter()) {
                let d = ai - bi;
                sq_dist += d * d;
            }
            (-gamma * sq_dist).exp()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrRegressor {
    config: SvrConfig,
    /// Dual coefficients alpha − alpha*, one per training sample
    dual_coefs: Option<Array1<f64>>,
    support_vectors: Option<Array2<f64>>,
    bias: f64,
    diagnostics: FitDiagnostics,
    is_fitted: bool,
}

impl SvrRegressor {
    pub fn new(config: SvrConfig) -> Self {
        Self {
            config,
            dual_coefs: None,
            support_vectors: None,
            bias: 0.0,
            diagnostics: FitDiagnostics {
                converged: false,
                iterations: 0,
            },
            is_fitted: false,
        }
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..=i {
                let v = kernel(self.config.kernel, x.row(i), x.row(j));
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
        }
        k
    }
}

impl Regressor for SvrRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ListingError::Training(format!(
                "dataset has {} samples, exceeding the maximum {} for the SVR kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let budget = FitBudget::new(self.config.max_fit_secs);
        let k = self.compute_kernel_matrix(x);
        let mut coefs: Array1<f64> = Array1::zeros(n);
        let mut bias = y.mean().unwrap_or(0.0);
        let lr = 1.0 / n as f64;

        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.config.max_iter {
            budget.check(iter)?;
            iterations = iter + 1;

            let pred = k.dot(&coefs) + bias;
            let mut max_update = 0.0f64;
            let mut bias_grad = 0.0;

            for i in 0..n {
                let residual = pred[i] - y[i];
                // Inside the tube there is nothing to correct.
                let grad = if residual > self.config.epsilon {
                    1.0
                } else if residual < -self.config.epsilon {
                    -1.0
                } else {
                    continue;
                };

                let updated = (coefs[i] - lr * grad).clamp(-self.config.c, self.config.c);
                max_update = max_update.max((updated - coefs[i]).abs());
                coefs[i] = updated;
                bias_grad += grad;
            }

            let bias_step = lr * bias_grad / n as f64;
            bias -= bias_step;
            max_update = max_update.max(bias_step.abs());

            if max_update < self.config.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                iterations,
                "SVR gradient descent hit the iteration cap without converging"
            );
        }

        self.dual_coefs = Some(coefs);
        self.support_vectors = Some(x.clone());
        self.bias = bias;
        self.diagnostics = FitDiagnostics {
            converged,
            iterations,
        };
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefs = self.dual_coefs.as_ref().ok_or(ListingError::ModelNotFitted)?;
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(ListingError::ModelNotFitted)?;
        if x.ncols() != sv.ncols() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", sv.ncols()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = Array1::zeros(x.nrows());
        for (i, row) in x.rows().into_iter().enumerate() {
            let mut acc = self.bias;
            for (j, sv_row) in sv.rows().into_iter().enumerate() {
                if coefs[j] != 0.0 {
                    acc += coefs[j] * kernel(self.config.kernel, row, sv_row);
                }
            }
            out[i] = acc;
        }
        Ok(out)
    }

    fn diagnostics(&self) -> FitDiagnostics {
        self.diagnostics
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Svr
    }
}
