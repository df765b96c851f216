//! Min-max scaling over feature matrices
//!
//! Parameters are per-column (min, max) pairs. One-hot indicator columns are
//! excluded via a skip list and pass through untouched. The parameters are
//! computed once from the designated reference partition and never recomputed
//! per partition.

use crate::error::{ListingError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which partition the scaler statistics are computed from.
///
/// `TrainOnly` is the correct contract: fit on the training partition, apply
/// the identical parameters everywhere. `Pooled` fits on train and test
/// combined — that leaks test information into the transform and exists only
/// to reproduce the source study's reported numbers for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerScope {
    TrainOnly,
    Pooled,
}

impl Default for ScalerScope {
    fn default() -> Self {
        ScalerScope::TrainOnly
    }
}

/// Fitted range for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnRange {
    min: f64,
    max: f64,
}

/// Min-max scaler for `Array2<f64>` feature matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Per-column parameters; `None` marks a skipped (indicator) column
    params: Vec<Option<ColumnRange>>,
    is_fitted: bool,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit per-column (min, max) on `x`, skipping the listed column indices.
    pub fn fit(&mut self, x: &Array2<f64>, skip_columns: &[usize]) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ListingError::Preprocessing(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        self.params = (0..x.ncols())
            .map(|col| {
                if skip_columns.contains(&col) {
                    return None;
                }
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for &v in x.column(col) {
                    if v < min {
                        min = v;
                    }
                    if v > max {
                        max = v;
                    }
                }
                Some(ColumnRange { min, max })
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    /// Map each scalable column into [0, 1] using the fitted parameters.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ListingError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (col, params) in self.params.iter().enumerate() {
            if let Some(range) = params {
                let span = range.max - range.min;
                let scale = if span == 0.0 { 1.0 } else { span };
                for v in out.column_mut(col) {
                    *v = (*v - range.min) / scale;
                }
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>, skip_columns: &[usize]) -> Result<Array2<f64>> {
        self.fit(x, skip_columns)?;
        self.transform(x)
    }

    /// Undo the scaling, recovering original units.
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ListingError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(ListingError::Shape {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (col, params) in self.params.iter().enumerate() {
            if let Some(range) = params {
                let span = range.max - range.min;
                let scale = if span == 0.0 { 1.0 } else { span };
                for v in out.column_mut(col) {
                    *v = *v * scale + range.min;
                }
            }
        }
        Ok(out)
    }

    /// The fitted (min, max) for a column, `None` for skipped columns.
    pub fn column_range(&self, col: usize) -> Option<(f64, f64)> {
        self.params
            .get(col)
            .and_then(|p| p.as_ref())
            .map(|r| (r.min, r.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scaled_values_in_unit_interval() {
        let x = array![[10.0, 0.0], [20.0, 1.0], [30.0, 0.0], [15.0, 1.0]];
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x, &[]).unwrap();

        for &v in scaled.iter() {
            assert!((0.0..=1.0).contains(&v), "value {} out of [0,1]", v);
        }
        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[2, 0]], 1.0);
    }

    #[test]
    fn test_indicator_columns_pass_through() {
        let x = array![[10.0, 1.0], [20.0, 0.0], [30.0, 1.0]];
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x, &[1]).unwrap();

        assert_eq!(scaled[[0, 1]], 1.0);
        assert_eq!(scaled[[1, 1]], 0.0);
        assert_eq!(scaled[[2, 1]], 1.0);
        assert!(scaler.column_range(1).is_none());
    }

    #[test]
    fn test_same_params_applied_to_other_partition() {
        let train = array![[0.0], [10.0]];
        let test = array![[5.0], [20.0]];

        let mut scaler = MinMaxScaler::new();
        scaler.fit(&train, &[]).unwrap();

        let scaled = scaler.transform(&test).unwrap();
        assert_eq!(scaled[[0, 0]], 0.5);
        // Test values beyond the training range exit [0,1]; that is the
        // correct train-only contract, not a bug.
        assert_eq!(scaled[[1, 0]], 2.0);
    }

    #[test]
    fn test_params_stable_under_reapplication() {
        let x = array![[1.0], [2.0], [3.0]];
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&x, &[]).unwrap();
        let before = scaler.column_range(0);

        let scaled = scaler.transform(&x).unwrap();
        let _ = scaler.transform(&scaled).unwrap();
        assert_eq!(scaler.column_range(0), before);
    }

    #[test]
    fn test_inverse_transform_roundtrip() {
        let x = array![[10.0, 1.0], [25.0, 0.0], [40.0, 1.0]];
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x, &[1]).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (a, b) in x.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_guard() {
        let x = array![[5.0], [5.0], [5.0]];
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&x, &[]).unwrap();
        // Zero range maps to 0, not NaN
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&array![[1.0, 2.0]], &[]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(ListingError::Shape { .. })
        ));
    }
}
