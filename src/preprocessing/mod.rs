//! Feature preprocessing
//!
//! Turns a curated table into aligned train/test matrices: one-hot encoding
//! for the categorical listing-period feature, a seeded 80/20 row split, and
//! min-max scaling fitted on the training partition and applied with
//! identical parameters to both partitions. No rows are dropped and the row
//! order of `X` and `y` stays aligned through every step.

mod encoder;
mod scaler;
mod split;

pub use encoder::{OneHotEncoder, UnseenPolicy};
pub use scaler::{MinMaxScaler, ScalerScope};
pub use split::{train_test_split, SplitIndices};

use crate::curation::CuratedTable;
use crate::error::{ListingError, Result};
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Fraction of rows held out for testing (default 0.2)
    pub test_fraction: f64,
    /// Seed for the split shuffle (default 42)
    pub seed: u64,
    /// Partition the scaler statistics come from (default train-only)
    pub scaler_scope: ScalerScope,
    /// Unseen-category handling for the one-hot encoder (default reject)
    pub unseen_policy: UnseenPolicy,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            scaler_scope: ScalerScope::default(),
            unseen_policy: UnseenPolicy::default(),
        }
    }
}

impl PreprocessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_scaler_scope(mut self, scope: ScalerScope) -> Self {
        self.scaler_scope = scope;
        self
    }

    pub fn with_unseen_policy(mut self, policy: UnseenPolicy) -> Self {
        self.unseen_policy = policy;
        self
    }
}

/// Output of preprocessing: aligned matrices plus the fitted transforms.
#[derive(Debug, Clone)]
pub struct DataSplits {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
    /// Matrix column names, numeric block first, then indicator blocks
    pub feature_names: Vec<String>,
    /// Column indices of the one-hot indicators (excluded from scaling)
    pub indicator_columns: Vec<usize>,
    /// Fitted scaler, reusable for inference-time data
    pub scaler: MinMaxScaler,
    /// Fitted encoders, one per categorical column
    pub encoders: Vec<OneHotEncoder>,
    /// Row indices of each partition in the curated table
    pub split: SplitIndices,
}

/// Feature preprocessor.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Build `(X_train, y_train, X_test, y_test)` from a curated table.
    pub fn prepare(&self, table: &CuratedTable) -> Result<DataSplits> {
        table.schema.validate_frame(&table.frame)?;
        let n_rows = table.frame.height();

        // Numeric block, in schema order.
        let numeric_names = table.schema.numeric_columns();
        let mut numeric = Array2::zeros((n_rows, numeric_names.len()));
        for (j, name) in numeric_names.iter().enumerate() {
            let ca = table
                .frame
                .column(name)?
                .as_materialized_series()
                .f64()
                .map_err(|e| ListingError::Preprocessing(e.to_string()))?
                .clone();
            for (i, opt) in ca.into_iter().enumerate() {
                numeric[[i, j]] = opt.ok_or_else(|| {
                    ListingError::Preprocessing(format!("null in curated column '{}'", name))
                })?;
            }
        }

        let mut feature_names: Vec<String> =
            numeric_names.iter().map(|s| s.to_string()).collect();
        let mut blocks: Vec<Array2<f64>> = vec![numeric];
        let mut encoders = Vec::new();
        let mut indicator_columns = Vec::new();
        let mut next_col = feature_names.len();

        // Indicator blocks, one per categorical column.
        for name in table.schema.categorical_columns() {
            let mut encoder = OneHotEncoder::new(name).with_policy(self.config.unseen_policy);
            let encoded = encoder.fit_transform(&table.frame)?;
            indicator_columns.extend(next_col..next_col + encoded.ncols());
            next_col += encoded.ncols();
            feature_names.extend(encoder.indicator_names());
            blocks.push(encoded);
            encoders.push(encoder);
        }

        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        let x = concatenate(Axis(1), &views)?;

        // Target vector, aligned with the matrix rows.
        let y_ca = table
            .frame
            .column(table.schema.target())?
            .as_materialized_series()
            .f64()
            .map_err(|e| ListingError::Preprocessing(e.to_string()))?
            .clone();
        let y: Array1<f64> = y_ca
            .into_iter()
            .map(|opt| {
                opt.ok_or_else(|| {
                    ListingError::Preprocessing("null in curated target".to_string())
                })
            })
            .collect::<Result<Vec<f64>>>()?
            .into();

        // Seeded partition, then scale with parameters from the reference
        // partition only.
        let split = train_test_split(n_rows, self.config.test_fraction, self.config.seed)?;
        let x_train_raw = x.select(Axis(0), &split.train);
        let x_test_raw = x.select(Axis(0), &split.test);
        let y_train = y.select(Axis(0), &split.train);
        let y_test = y.select(Axis(0), &split.test);

        let mut scaler = MinMaxScaler::new();
        match self.config.scaler_scope {
            ScalerScope::TrainOnly => {
                scaler.fit(&x_train_raw, &indicator_columns)?;
            }
            ScalerScope::Pooled => {
                // Known-leaky comparison mode; see ScalerScope docs.
                scaler.fit(&x, &indicator_columns)?;
            }
        }
        let x_train = scaler.transform(&x_train_raw)?;
        let x_test = scaler.transform(&x_test_raw)?;

        debug!(
            "prepared {} train rows, {} test rows, {} feature columns",
            x_train.nrows(),
            x_test.nrows(),
            x_train.ncols()
        );

        Ok(DataSplits {
            x_train,
            y_train,
            x_test,
            y_test,
            feature_names,
            indicator_columns,
            scaler,
            encoders,
            split,
        })
    }
}
