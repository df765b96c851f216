//! listing-hits - Apartment-listing demand regression
//!
//! A reproduction pipeline predicting how many hits a rental listing
//! receives, from raw CSV to a per-model RMSE report:
//!
//! - [`data`] - CSV loading into DataFrames
//! - [`schema`] - The named feature schema and column kinds
//! - [`curation`] - Sentinel normalization, column dropping, imputation
//! - [`preprocessing`] - One-hot encoding, seeded splitting, min-max scaling
//! - [`training`] - The closed set of regression algorithms
//! - [`evaluation`] - RMSE and companion metrics on the held-out partition
//! - [`benchmark`] - Repeated-fit wall-clock timing
//! - [`experiment`] - End-to-end orchestration into a report

pub mod error;

pub mod benchmark;
pub mod curation;
pub mod data;
pub mod evaluation;
pub mod experiment;
pub mod preprocessing;
pub mod schema;
pub mod training;

pub use error::{ListingError, Result};

pub use benchmark::{FitBenchmark, TimingSummary};
pub use curation::{CuratedTable, CurationConfig, Curator};
pub use data::DatasetLoader;
pub use evaluation::{evaluate, evaluate_model, rmse, RegressionMetrics};
pub use experiment::{run_experiment, ExperimentConfig, ExperimentReport, ModelResult};
pub use preprocessing::{
    DataSplits, MinMaxScaler, OneHotEncoder, PreprocessConfig, Preprocessor, ScalerScope,
    UnseenPolicy,
};
pub use schema::{FeatureColumn, FeatureKind, FeatureSchema};
pub use training::{
    fit_model, FitDiagnostics, ModelConfig, ModelKind, Regressor,
};
