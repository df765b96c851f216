//! Model training
//!
//! A closed set of off-the-shelf regression algorithms behind a common
//! `Regressor` trait: ordinary least squares, a Poisson GLM, a regression
//! tree, a random forest, epsilon-insensitive SVR, a single-hidden-layer
//! perceptron, and an averaging ensemble over fitted constituents.

mod config;
pub mod ensemble;
pub mod forest;
pub mod linear;
pub mod mlp;
pub mod poisson;
pub mod svr;
pub mod tree;

pub use config::{
    EnsembleConfig, ForestConfig, MlpConfig, ModelConfig, ModelKind, OlsConfig, PoissonConfig,
    SvrConfig, SvrKernel, TreeConfig,
};
pub use ensemble::AveragingEnsemble;
pub use forest::RandomForestRegressor;
pub use linear::OlsRegression;
pub use mlp::MlpRegressor;
pub use poisson::PoissonRegression;
pub use svr::SvrRegressor;
pub use tree::RegressionTree;

use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a fit beyond the learned parameters.
///
/// Hitting an iteration cap is not fatal: the partially converged parameters
/// are still a usable model, and `converged` records the distinction for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub converged: bool,
    pub iterations: usize,
}

impl FitDiagnostics {
    /// Diagnostics for a closed-form (non-iterative) fit.
    pub fn closed_form() -> Self {
        Self {
            converged: true,
            iterations: 0,
        }
    }
}

/// Cooperative wall-clock budget for a single fit invocation.
///
/// Iterative fitters call `check` once per iteration; exceeding the budget
/// aborts the fit with a timeout error rather than consuming CPU unbounded.
#[derive(Debug, Clone)]
pub struct FitBudget {
    max_secs: Option<f64>,
    started: Instant,
}

impl FitBudget {
    pub fn new(max_secs: Option<f64>) -> Self {
        Self {
            max_secs,
            started: Instant::now(),
        }
    }

    /// Unlimited budget.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Err when the elapsed wall-clock time exceeds the budget.
    pub fn check(&self, iterations: usize) -> Result<()> {
        if let Some(max) = self.max_secs {
            if self.started.elapsed().as_secs_f64() > max {
                return Err(ListingError::FitTimeout {
                    budget_secs: max,
                    iterations,
                });
            }
        }
        Ok(())
    }
}

/// A regression model that can be fitted once and then queried.
pub trait Regressor: Send + Sync {
    /// Fit on training data. Shapes must agree; the data is never mutated.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Convergence information from the last fit.
    fn diagnostics(&self) -> FitDiagnostics;

    /// Variant this model belongs to.
    fn kind(&self) -> ModelKind;
}

/// Shape check shared by every fitter.
pub(crate) fn check_fit_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ListingError::Shape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(ListingError::Training("empty training set".to_string()));
    }
    Ok(())
}

/// Build and fit the model a configuration record describes.
///
/// Ensemble configurations fit each constituent first, then wrap the fitted
/// models in an [`AveragingEnsemble`].
pub fn fit_model(
    config: &ModelConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Box<dyn Regressor>> {
    match config {
        ModelConfig::Ols(cfg) => {
            let mut model = OlsRegression::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::PoissonGlm(cfg) => {
            let mut model = PoissonRegression::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::Tree(cfg) => {
            let mut model = RegressionTree::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::RandomForest(cfg) => {
            let mut model = RandomForestRegressor::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::Svr(cfg) => {
            let mut model = SvrRegressor::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::Mlp(cfg) => {
            let mut model = MlpRegressor::new(cfg.clone());
            model.fit(x, y)?;
            Ok(Box::new(model))
        }
        ModelConfig::VotingEnsemble(cfg) => {
            let mut constituents: Vec<Arc<dyn Regressor>> = Vec::new();
            for member in &cfg.constituents {
                constituents.push(Arc::from(fit_model(member, x, y)?));
            }
            Ok(Box::new(AveragingEnsemble::from_fitted(constituents)?))
        }
    }
}
