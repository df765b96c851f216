//! Fit-time benchmarking
//!
//! Measures wall-clock fitting cost by repeating the fit on identical
//! training data with a fresh model instance per repetition, then reducing
//! the raw samples to mean and sample standard deviation. The raw samples
//! stay in the summary so the statistics can be recomputed or re-reduced
//! downstream.

use crate::error::{ListingError, Result};
use crate::training::{fit_model, ModelConfig};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Timing distribution for one model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// Raw per-repetition fit durations, in seconds, in execution order
    pub samples: Vec<f64>,
    /// Mean fit duration in seconds
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator; 0 for one sample)
    pub std_dev: f64,
    /// Repetitions whose fit hit an iteration cap
    pub non_converged: usize,
}

impl TimingSummary {
    /// Reduce raw duration samples to summary statistics.
    pub fn from_samples(samples: Vec<f64>, non_converged: usize) -> Result<Self> {
        if samples.is_empty() {
            return Err(ListingError::Evaluation(
                "cannot summarize zero timing samples".to_string(),
            ));
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let std_dev = if samples.len() < 2 {
            0.0
        } else {
            let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        };

        Ok(Self {
            samples,
            mean,
            std_dev,
            non_converged,
        })
    }
}

/// Benchmark harness for model fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitBenchmark {
    /// Number of fit repetitions (default 100)
    pub repetitions: usize,
}

impl Default for FitBenchmark {
    fn default() -> Self {
        Self { repetitions: 100 }
    }
}

impl FitBenchmark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Time `repetitions` independent fits of `config` on fixed data.
    ///
    /// Every repetition constructs and fits a fresh model, so no repetition
    /// reuses state from an earlier one. Only the fit is timed; model
    /// construction stays outside the clock.
    pub fn run(
        &self,
        config: &ModelConfig,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<TimingSummary> {
        if self.repetitions == 0 {
            return Err(ListingError::InvalidParameter {
                name: "repetitions".to_string(),
                value: "0".to_string(),
                reason: "at least one repetition is required".to_string(),
            });
        }

        let mut samples = Vec::with_capacity(self.repetitions);
        let mut non_converged = 0;

        for _ in 0..self.repetitions {
            let start = Instant::now();
            let model = fit_model(config, x, y)?;
            samples.push(start.elapsed().as_secs_f64());
            if !model.diagnostics().converged {
                non_converged += 1;
            }
        }

        let summary = TimingSummary::from_samples(samples, non_converged)?;
        info!(
            model = config.kind().label(),
            repetitions = self.repetitions,
            mean_secs = summary.mean,
            "fit benchmark complete"
        );
        Ok(summary)
    }
}
