//! Averaging ensemble over independently fitted regressors
//!
//! The ensemble owns its constituents as trait objects and predicts the
//! unweighted mean of their predictions. Constituents are fitted before
//! construction; the ensemble itself has nothing to fit.

use super::config::ModelKind;
use super::{FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use std::sync::Arc;

pub struct AveragingEnsemble {
    constituents: Vec<Arc<dyn Regressor>>,
}

impl AveragingEnsemble {
    /// Wrap already-fitted models. Errs on an empty list.
    pub fn from_fitted(constituents: Vec<Arc<dyn Regressor>>) -> Result<Self> {
        if constituents.is_empty() {
            return Err(ListingError::Training(
                "an averaging ensemble needs at least one constituent".to_string(),
            ));
        }
        Ok(Self { constituents })
    }

    pub fn n_constituents(&self) -> usize {
        self.constituents.len()
    }

    /// Per-constituent predictions, in constituent order.
    pub fn constituent_predictions(&self, x: &Array2<f64>) -> Result<Vec<Array1<f64>>> {
        self.constituents.iter().map(|m| m.predict(x)).collect()
    }
}

impl Regressor for AveragingEnsemble {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
        // Constituents arrive fitted; refitting through the ensemble would
        // hide which configuration each one was fitted with.
        Err(ListingError::Training(
            "averaging ensembles are built from fitted constituents".to_string(),
        ))
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mut sum = Array1::zeros(x.nrows());
        for model in &self.constituents {
            sum = sum + model.predict(x)?;
        }
        Ok(sum / self.constituents.len() as f64)
    }

    fn diagnostics(&self) -> FitDiagnostics {
        // Converged iff every constituent converged; iterations is the sum.
        let mut converged = true;
        let mut iterations = 0;
        for model in &self.constituents {
            let d = model.diagnostics();
            converged &= d.converged;
            iterations += d.iterations;
        }
        FitDiagnostics {
            converged,
            iterations,
        }
    }

    fn kind(&self) -> ModelKind {
        ModelKind::VotingEnsemble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{fit_model, ModelConfig, ModelKind};
    use ndarray::array;

    struct ConstantModel(f64);

    impl Regressor for ConstantModel {
        fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
            Ok(())
        }
        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(x.nrows(), self.0))
        }
        fn diagnostics(&self) -> FitDiagnostics {
            FitDiagnostics::closed_form()
        }
        fn kind(&self) -> ModelKind {
            ModelKind::Ols
        }
    }

    #[test]
    fn test_prediction_is_exact_mean() {
        let ensemble = AveragingEnsemble::from_fitted(vec![
            Arc::new(ConstantModel(1.0)),
            Arc::new(ConstantModel(2.0)),
            Arc::new(ConstantModel(6.0)),
        ])
        .unwrap();

        let pred = ensemble.predict(&array![[0.0], [1.0]]).unwrap();
        assert_eq!(pred, array![3.0, 3.0]);
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        assert!(AveragingEnsemble::from_fitted(Vec::new()).is_err());
    }

    #[test]
    fn test_ensemble_from_config_dispatch() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0, 11.0];

        let config = ModelConfig::default_for(ModelKind::VotingEnsemble);
        let model = fit_model(&config, &x, &y).unwrap();
        assert_eq!(model.kind(), ModelKind::VotingEnsemble);

        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.len(), 6);
        // Constituents all fit this data well, so the average stays close.
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 3.0);
        }
    }

    #[test]
    fn test_refit_through_ensemble_rejected() {
        let mut ensemble =
            AveragingEnsemble::from_fitted(vec![Arc::new(ConstantModel(1.0))]).unwrap();
        assert!(ensemble.fit(&array![[0.0]], &array![1.0]).is_err());
    }
}
