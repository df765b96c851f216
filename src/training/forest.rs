//! Random forest of regression trees
//!
//! Trees are fitted sequentially on seeded bootstrap resamples and their
//! predictions averaged. Each tree draws its rows from a per-tree RNG stream
//! derived from the forest seed, so the forest is deterministic end to end.

use super::config::{ForestConfig, ModelKind};
use super::tree::RegressionTree;
use super::{check_fit_shapes, FitBudget, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    trees: Vec<RegressionTree>,
    n_features: usize,
    is_fitted: bool,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
            is_fitted: false,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        if self.config.n_estimators == 0 {
            return Err(ListingError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "a forest needs at least one tree".to_string(),
            });
        }

        let budget = FitBudget::new(self.config.max_fit_secs);
        let n_samples = x.nrows();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        self.trees = Vec::with_capacity(self.config.n_estimators);
        for tree_idx in 0..self.config.n_estimators {
            budget.check(tree_idx)?;

            let (x_boot, y_boot) = if self.config.bootstrap {
                let indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                (x.select(Axis(0), &indices), y.select(Axis(0), &indices))
            } else {
                (x.clone(), y.clone())
            };

            let mut tree = RegressionTree::new(self.config.tree.clone());
            tree.fit(&x_boot, &y_boot)?;
            self.trees.push(tree);
        }

        debug!(n_trees = self.trees.len(), "random forest fitted");
        self.n_features = x.ncols();
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ListingError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ListingError::Shape {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut sum = Array1::zeros(x.nrows());
        for tree in &self.trees {
            sum = sum + tree.predict(x)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn diagnostics(&self) -> FitDiagnostics {
        FitDiagnostics {
            converged: self.is_fitted,
            iterations: self.trees.len(),
        }
    }

    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }
}
