//! Model evaluation
//!
//! Root-mean-squared error on the held-out partition is the study's single
//! comparison metric; the companion metrics exist for diagnostics only and
//! never enter the ranking.

use crate::error::{ListingError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Root-mean-squared error between predictions and targets.
pub fn rmse(predictions: &Array1<f64>, targets: &Array1<f64>) -> Result<f64> {
    if predictions.len() != targets.len() {
        return Err(ListingError::Shape {
            expected: format!("{} predictions", targets.len()),
            actual: format!("{} predictions", predictions.len()),
        });
    }
    if predictions.is_empty() {
        return Err(ListingError::Evaluation(
            "cannot score an empty prediction vector".to_string(),
        ));
    }

    let mse = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f64>()
        / predictions.len() as f64;
    Ok(mse.sqrt())
}

/// Held-out-partition metrics for one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

/// Compute the full metric set on one (predictions, targets) pair.
pub fn evaluate(predictions: &Array1<f64>, targets: &Array1<f64>) -> Result<RegressionMetrics> {
    let root = rmse(predictions, targets)?;
    let n = targets.len() as f64;

    let mae = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t).abs())
        .sum::<f64>()
        / n;

    let mean_target = targets.sum() / n;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean_target) * (t - mean_target)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(targets.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    // A constant target makes R² undefined; report 0 rather than NaN.
    let r2 = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(RegressionMetrics {
        mse: root * root,
        rmse: root,
        mae,
        r2,
        n_samples: targets.len(),
    })
}

/// Score a fitted model on a held-out partition.
pub fn evaluate_model(
    model: &dyn crate::training::Regressor,
    x_test: &ndarray::Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<RegressionMetrics> {
    let predictions = model.predict(x_test)?;
    evaluate(&predictions, y_test)
}
