//! Experiment orchestration
//!
//! Runs the full study on one raw frame: curate, preprocess, fit every
//! configured model, and score each one on the held-out partition. All
//! results thread through the returned report; nothing accumulates in
//! shared state, so two experiments in one process cannot contaminate
//! each other.

use crate::curation::{CurationConfig, Curator};
use crate::error::Result;
use crate::evaluation::{evaluate, RegressionMetrics};
use crate::preprocessing::{
    DataSplits, PreprocessConfig, Preprocessor, ScalerScope, UnseenPolicy,
};
use crate::schema::FeatureSchema;
use crate::training::{fit_model, FitDiagnostics, ModelConfig, ModelKind};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full configuration for one experiment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Seed for the split shuffle (default 42)
    pub seed: u64,
    /// Held-out fraction (default 0.2)
    pub test_fraction: f64,
    /// Scaler fitting scope (default train-only)
    pub scaler_scope: ScalerScope,
    /// Unseen-category handling (default reject)
    pub unseen_policy: UnseenPolicy,
    /// Models to fit and score, in report order
    pub models: Vec<ModelConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            scaler_scope: ScalerScope::default(),
            unseen_policy: UnseenPolicy::default(),
            models: vec![
                ModelConfig::default_for(ModelKind::Ols),
                ModelConfig::default_for(ModelKind::PoissonGlm),
                ModelConfig::default_for(ModelKind::Tree),
                ModelConfig::default_for(ModelKind::RandomForest),
                ModelConfig::default_for(ModelKind::Svr),
                ModelConfig::default_for(ModelKind::Mlp),
                ModelConfig::default_for(ModelKind::VotingEnsemble),
            ],
        }
    }
}

impl ExperimentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_models(mut self, models: Vec<ModelConfig>) -> Self {
        self.models = models;
        self
    }

    pub fn with_scaler_scope(mut self, scope: ScalerScope) -> Self {
        self.scaler_scope = scope;
        self
    }
}

/// Score card for one fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResult {
    pub kind: ModelKind,
    /// Held-out metrics; RMSE is the comparison figure
    pub metrics: RegressionMetrics,
    pub diagnostics: FitDiagnostics,
}

/// Everything one experiment produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub results: Vec<ModelResult>,
    pub n_train_rows: usize,
    pub n_test_rows: usize,
    pub feature_names: Vec<String>,
}

impl ExperimentReport {
    /// Result with the lowest held-out RMSE.
    pub fn best(&self) -> Option<&ModelResult> {
        self.results.iter().min_by(|a, b| {
            a.metrics
                .rmse
                .partial_cmp(&b.metrics.rmse)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Serialize the report to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a report from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Run the full pipeline on a raw frame and return the per-model report.
pub fn run_experiment(
    frame: &DataFrame,
    schema: FeatureSchema,
    curation: CurationConfig,
    config: &ExperimentConfig,
) -> Result<ExperimentReport> {
    let curator = Curator::with_config(schema, curation);
    let curated = curator.curate(frame)?;

    let preprocess = PreprocessConfig::new()
        .with_seed(config.seed)
        .with_test_fraction(config.test_fraction)
        .with_scaler_scope(config.scaler_scope)
        .with_unseen_policy(config.unseen_policy);
    let splits = Preprocessor::with_config(preprocess).prepare(&curated)?;

    let results = score_models(&config.models, &splits)?;

    Ok(ExperimentReport {
        results,
        n_train_rows: splits.x_train.nrows(),
        n_test_rows: splits.x_test.nrows(),
        feature_names: splits.feature_names,
    })
}

/// Fit and score each configuration on already-prepared splits.
pub fn score_models(models: &[ModelConfig], splits: &DataSplits) -> Result<Vec<ModelResult>> {
    let mut results = Vec::with_capacity(models.len());
    for config in models {
        let model = fit_model(config, &splits.x_train, &splits.y_train)?;
        let predictions = model.predict(&splits.x_test)?;
        let metrics = evaluate(&predictions, &splits.y_test)?;
        info!(
            model = config.kind().label(),
            rmse = metrics.rmse,
            converged = model.diagnostics().converged,
            "model scored"
        );
        results.push(ModelResult {
            kind: config.kind(),
            metrics,
            diagnostics: model.diagnostics(),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureKind;
    use polars::prelude::*;

    fn frame_and_schema() -> (DataFrame, FeatureSchema) {
        let schema = FeatureSchema::new(
            vec![
                ("no_rooms", FeatureKind::Count),
                ("base_rent", FeatureKind::Cost),
                ("ad_period", FeatureKind::Categorical),
            ],
            "hits",
        );
        let n = 40;
        let rooms: Vec<f64> = (0..n).map(|i| 1.0 + (i % 4) as f64).collect();
        let rent: Vec<f64> = (0..n).map(|i| 300.0 + 37.0 * (i % 13) as f64).collect();
        let period: Vec<&str> = (0..n)
            .map(|i| ["Sep18", "May19", "Oct19", "Feb20"][i % 4])
            .collect();
        let hits: Vec<f64> = rooms
            .iter()
            .zip(rent.iter())
            .map(|(r, b)| 50.0 + 20.0 * r + 0.1 * b)
            .collect();
        let frame = df!(
            "no_rooms" => rooms,
            "base_rent" => rent,
            "ad_period" => period,
            "hits" => hits
        )
        .unwrap();
        (frame, schema)
    }

    #[test]
    fn test_report_covers_every_model() {
        let (frame, schema) = frame_and_schema();
        let config = ExperimentConfig::new().with_models(vec![
            ModelConfig::default_for(ModelKind::Ols),
            ModelConfig::default_for(ModelKind::Tree),
        ]);
        let report = run_experiment(
            &frame,
            schema,
            CurationConfig::default().with_min_features(2),
            &config,
        )
        .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].kind, ModelKind::Ols);
        assert_eq!(report.n_train_rows + report.n_test_rows, 40);
        assert!(report.best().is_some());
    }

    #[test]
    fn test_two_runs_do_not_interfere() {
        // Re-running the same experiment yields an identical report: nothing
        // carries over between runs.
        let (frame, schema) = frame_and_schema();
        let config = ExperimentConfig::new()
            .with_models(vec![ModelConfig::default_for(ModelKind::Ols)]);
        let curation = CurationConfig::default().with_min_features(2);

        let a = run_experiment(&frame, schema.clone(), curation.clone(), &config).unwrap();
        let b = run_experiment(&frame, schema, curation, &config).unwrap();

        assert_eq!(a.results[0].metrics, b.results[0].metrics);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let (frame, schema) = frame_and_schema();
        let config = ExperimentConfig::new()
            .with_models(vec![ModelConfig::default_for(ModelKind::Ols)]);
        let report = run_experiment(
            &frame,
            schema,
            CurationConfig::default().with_min_features(2),
            &config,
        )
        .unwrap();

        let json = report.to_json().unwrap();
        let back = ExperimentReport::from_json(&json).unwrap();
        assert_eq!(back.results[0].metrics, report.results[0].metrics);
        assert_eq!(back.feature_names, report.feature_names);
    }

    #[test]
    fn test_ols_fits_linear_target_well() {
        let (frame, schema) = frame_and_schema();
        let config = ExperimentConfig::new()
            .with_models(vec![ModelConfig::default_for(ModelKind::Ols)]);
        let report = run_experiment(
            &frame,
            schema,
            CurationConfig::default().with_min_features(2),
            &config,
        )
        .unwrap();

        // The target is an exact linear function of the features; the
        // one-hot block is collinear with the intercept, so the solver's
        // ridge fallback leaves a tiny residual.
        assert!(report.results[0].metrics.rmse < 1e-3);
    }
}
