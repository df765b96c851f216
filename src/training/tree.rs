//! Regression tree with an MSE split criterion
//!
//! Splits are scanned sequentially over candidate thresholds (midpoints of
//! adjacent sorted values) with incrementally maintained sum/sum-of-squares
//! statistics, so evaluating a threshold never re-iterates the partition.

use super::config::{ModelKind, TreeConfig};
use super::{check_fit_shapes, FitBudget, FitDiagnostics, Regressor};
use crate::error::{ListingError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
    nodes_built: usize,
    is_fitted: bool,
}

impl RegressionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
            nodes_built: 0,
            is_fitted: false,
        }
    }

    /// Depth of the fitted tree (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + node_depth(left).max(node_depth(right))
                }
            }
        }
        self.root.as_ref().map(node_depth).unwrap_or(0)
    }

    fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Variance from count / sum / sum-of-squares.
    fn impurity(count: usize, sum: f64, sq_sum: f64) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let n = count as f64;
        let mean = sum / n;
        (sq_sum / n - mean * mean).max(0.0)
    }

    fn is_pure(values: &[f64]) -> bool {
        values
            .windows(2)
            .all(|w| (w[0] - w[1]).abs() < f64::EPSILON)
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        budget: &FitBudget,
        nodes_built: &mut usize,
    ) -> Result<TreeNode> {
        budget.check(*nodes_built)?;
        *nodes_built += 1;

        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.config.min_samples_split
            || n_samples <= self.config.min_samples_leaf
            || self.config.max_depth.map_or(false, |d| depth >= d)
            || Self::is_pure(&y_subset);

        if should_stop {
            return Ok(TreeNode::Leaf {
                value: Self::mean(&y_subset),
                n_samples,
            });
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices) else {
            return Ok(TreeNode::Leaf {
                value: Self::mean(&y_subset),
                n_samples,
            });
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.config.min_samples_leaf
            || right_indices.len() < self.config.min_samples_leaf
        {
            return Ok(TreeNode::Leaf {
                value: Self::mean(&y_subset),
                n_samples,
            });
        }

        let left = Box::new(self.build(x, y, &left_indices, depth + 1, budget, nodes_built)?);
        let right = Box::new(self.build(x, y, &right_indices, depth + 1, budget, nodes_built)?);

        Ok(TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        })
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq_sum: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = Self::impurity(indices.len(), total_sum, total_sq_sum);

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..x.ncols() {
            // Sort the partition once per feature, then sweep thresholds by
            // moving samples from right to left.
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature_idx]]
                    .partial_cmp(&x[[b, feature_idx]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_count = 0usize;
            let mut left_sum = 0.0;
            let mut left_sq_sum = 0.0;

            for w in 0..order.len() - 1 {
                let idx = order[w];
                left_count += 1;
                left_sum += y[idx];
                left_sq_sum += y[idx] * y[idx];

                let v = x[[idx, feature_idx]];
                let v_next = x[[order[w + 1], feature_idx]];
                if v == v_next {
                    continue;
                }

                let right_count = indices.len() - left_count;
                if left_count < self.config.min_samples_leaf
                    || right_count < self.config.min_samples_leaf
                {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq_sum = total_sq_sum - left_sq_sum;
                let weighted = (left_count as f64
                    * Self::impurity(left_count, left_sum, left_sq_sum)
                    + right_count as f64
                        * Self::impurity(right_count, right_sum, right_sq_sum))
                    / n;

                let gain = parent_impurity - weighted;
                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, (v + v_next) / 2.0, gain));
                }
            }
        }

        best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn predict_one(node: &TreeNode, row: ndarray::ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if row[*feature_idx] <= *threshold {
                    Self::predict_one(left, row)
                } else {
                    Self::predict_one(right, row)
                }
            }
        }
    }
}

impl Regressor for RegressionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let budget = FitBudget::new(self.config.max_fit_secs);
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut nodes_built = 0;
        let root = self.build(x, y, &indices, 0, &budget, &mut nodes_built)?;

        self.root = Some(root);
        self.n_features = x.ncols();
        self.nodes_built = nodes_built;
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ListingError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ListingError::Shape {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| Self::predict_one(root, row))
            .collect())
    }

    fn diagnostics(&self) -> FitDiagnostics {
        FitDiagnostics {
            converged: self.is_fitted,
            iterations: self.nodes_built,
        }
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Tree
    }
}
