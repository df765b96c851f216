//! Single-hidden-layer perceptron regressor
//!
//! Tanh hidden activation, linear output, full-batch gradient descent with
//! momentum. Weights are initialized from a seeded RNG so fits are
//! reproducible.

use super::config::{MlpConfig, ModelKind};
use super::{check_fit_shapes, FitBudget, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layers {
    /// Input-to-hidden weights, (n_features, hidden_units)
    w1: Array2<f64>,
    /// Hidden biases
    b1: Array1<f64>,
    /// Hidden-to-output weights
    w2: Array1<f64>,
    /// Output bias
    b2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpRegressor {
    config: MlpConfig,
    layers: Option<Layers>,
    diagnostics: FitDiagnostics,
    is_fitted: bool,
}

impl MlpRegressor {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            layers: None,
            diagnostics: FitDiagnostics {
                converged: false,
                iterations: 0,
            },
            is_fitted: false,
        }
    }

    fn forward(layers: &Layers, x: &Array2<f64>) -> (Array2<f64>, Array1<f64>) {
        let mut hidden = x.dot(&layers.w1);
        for mut row in hidden.rows_mut() {
            row += &layers.b1;
        }
        let hidden = hidden.mapv(f64::tanh);
        let output = hidden.dot(&layers.w2) + layers.b2;
        (hidden, output)
    }
}

impl Regressor for MlpRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        if self.config.hidden_units == 0 {
            return Err(ListingError::InvalidParameter {
                name: "hidden_units".to_string(),
                value: "0".to_string(),
                reason: "the hidden layer needs at least one unit".to_string(),
            });
        }

        let budget = FitBudget::new(self.config.max_fit_secs);
        let n = x.nrows() as f64;
        let n_features = x.ncols();
        let h = self.config.hidden_units;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        // Xavier-style uniform init scaled by fan-in.
        let scale1 = (1.0 / n_features as f64).sqrt();
        let scale2 = (1.0 / h as f64).sqrt();
        let mut layers = Layers {
            w1: Array2::from_shape_fn((n_features, h), |_| rng.gen_range(-scale1..scale1)),
            b1: Array1::zeros(h),
            w2: Array1::from_shape_fn(h, |_| rng.gen_range(-scale2..scale2)),
            b2: 0.0,
        };

        let mut vel_w1: Array2<f64> = Array2::zeros((n_features, h));
        let mut vel_b1: Array1<f64> = Array1::zeros(h);
        let mut vel_w2: Array1<f64> = Array1::zeros(h);
        let mut vel_b2 = 0.0;

        let mut prev_loss = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        for epoch in 0..self.config.max_iter {
            budget.check(epoch)?;
            iterations = epoch + 1;

            let (hidden, output) = Self::forward(&layers, x);
            let error = &output - y;
            let loss = error.mapv(|e| e * e).sum() / n;

            // Backprop: linear output, tanh hidden.
            let grad_out = &error * (2.0 / n);
            let grad_w2 = hidden.t().dot(&grad_out);
            let grad_b2 = grad_out.sum();

            let mut grad_hidden = Array2::zeros(hidden.raw_dim());
            for ((i, j), g) in grad_hidden.indexed_iter_mut() {
                let a = hidden[[i, j]];
                *g = grad_out[i] * layers.w2[j] * (1.0 - a * a);
            }
            let grad_w1 = x.t().dot(&grad_hidden);
            let grad_b1 = grad_hidden.sum_axis(ndarray::Axis(0));

            let lr = self.config.learning_rate;
            let m = self.config.momentum;
            vel_w1 = vel_w1 * m - &(grad_w1 * lr);
            vel_b1 = vel_b1 * m - &(grad_b1 * lr);
            vel_w2 = vel_w2 * m - &(grad_w2 * lr);
            vel_b2 = vel_b2 * m - grad_b2 * lr;

            layers.w1 += &vel_w1;
            layers.b1 += &vel_b1;
            layers.w2 += &vel_w2;
            layers.b2 += vel_b2;

            if (prev_loss - loss).abs() < self.config.tol {
                converged = true;
                break;
            }
            prev_loss = loss;
        }

        if !converged {
            debug!(
                iterations,
                "perceptron training hit the epoch cap without converging"
            );
        }

        self.layers = Some(layers);
        self.diagnostics = FitDiagnostics {
            converged,
            iterations,
        };
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let layers = self.layers.as_ref().ok_or(ListingError::ModelNotFitted)?;
        if x.ncols() != layers.w1.nrows() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", layers.w1.nrows()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(Self::forward(layers, x).1)
    }

    fn diagnostics(&self) -> FitDiagnostics {
        self.diagnostics
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Mlp
    }
}
