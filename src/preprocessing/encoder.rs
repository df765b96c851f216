//! One-hot encoding for categorical columns
//!
//! Levels are learned at fit time and sorted, so indicator column order is
//! stable across runs. Transforming a frame with a level the encoder never
//! saw is an error by default; the unknown-bucket policy instead routes such
//! rows to a dedicated indicator.

use crate::error::{ListingError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// How to handle category levels absent from the fitted level set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnseenPolicy {
    /// Fail the transform on the first unseen level
    Reject,
    /// Route unseen levels to a trailing `<unknown>` indicator
    UnknownBucket,
}

impl Default for UnseenPolicy {
    fn default() -> Self {
        UnseenPolicy::Reject
    }
}

const UNKNOWN_LABEL: &str = "<unknown>";

/// One-hot encoder for a single string column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    /// Fitted levels, sorted and deduplicated
    levels: Vec<String>,
    policy: UnseenPolicy,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            levels: Vec::new(),
            policy: UnseenPolicy::default(),
            is_fitted: false,
        }
    }

    pub fn with_policy(mut self, policy: UnseenPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Fitted levels in indicator order.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Number of indicator columns the transform produces.
    pub fn n_indicators(&self) -> usize {
        match self.policy {
            UnseenPolicy::Reject => self.levels.len(),
            UnseenPolicy::UnknownBucket => self.levels.len() + 1,
        }
    }

    /// Indicator column names, `column=level` per fitted level.
    pub fn indicator_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .levels
            .iter()
            .map(|level| format!("{}={}", self.column, level))
            .collect();
        if self.policy == UnseenPolicy::UnknownBucket {
            names.push(format!("{}={}", self.column, UNKNOWN_LABEL));
        }
        names
    }

    fn column_values(&self, df: &DataFrame) -> Result<Vec<String>> {
        let ca = df
            .column(&self.column)?
            .as_materialized_series()
            .str()
            .map_err(|e| ListingError::Preprocessing(e.to_string()))?
            .clone();

        ca.into_iter()
            .enumerate()
            .map(|(i, opt)| {
                opt.map(str::to_string).ok_or_else(|| {
                    ListingError::Preprocessing(format!(
                        "null category in column '{}' at row {}; curation should have imputed it",
                        self.column, i
                    ))
                })
            })
            .collect()
    }

    /// Learn the level set from the column's distinct values.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut levels = self.column_values(df)?;
        levels.sort();
        levels.dedup();
        if levels.is_empty() {
            return Err(ListingError::Preprocessing(format!(
                "categorical column '{}' has no values to fit on",
                self.column
            )));
        }
        self.levels = levels;
        self.is_fitted = true;
        Ok(self)
    }

    /// Produce the indicator matrix, one row per frame row.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ListingError::ModelNotFitted);
        }

        let values = self.column_values(df)?;
        let mut out = Array2::zeros((values.len(), self.n_indicators()));
        for (row, value) in values.iter().enumerate() {
            match self.levels.binary_search(value) {
                Ok(idx) => out[[row, idx]] = 1.0,
                Err(_) => match self.policy {
                    UnseenPolicy::Reject => {
                        return Err(ListingError::UnseenLevel {
                            column: self.column.clone(),
                            level: value.clone(),
                        });
                    }
                    UnseenPolicy::UnknownBucket => {
                        out[[row, self.levels.len()]] = 1.0;
                    }
                },
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }
}
