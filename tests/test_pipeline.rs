//! End-to-end pipeline tests on synthetic listing data

use listing_hits::{
    fit_model, CurationConfig, Curator, DatasetLoader, ExperimentConfig, FeatureKind,
    FeatureSchema, ModelConfig, ModelKind, PreprocessConfig, Preprocessor,
};
use listing_hits::training::OlsRegression;
use listing_hits::Regressor;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::io::Write;

const NOISE_STD: f64 = 0.5;

/// x uniform in [0, 1000], y = 2x + 10 + uniform noise in [-NOISE_STD, NOISE_STD].
fn synthetic_rows(n: usize) -> Vec<(f64, f64)> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    (0..n)
        .map(|_| {
            let x = rng.gen_range(0.0..1000.0);
            let noise = rng.gen_range(-NOISE_STD..NOISE_STD);
            (x, 2.0 * x + 10.0 + noise)
        })
        .collect()
}

fn synthetic_schema() -> FeatureSchema {
    FeatureSchema::new(vec![("living_space", FeatureKind::Cost)], "hits")
}

#[test]
fn test_csv_to_report_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "living_space,hits").unwrap();
    for (x, y) in synthetic_rows(100) {
        writeln!(file, "{},{}", x, y).unwrap();
    }

    let frame = DatasetLoader::new()
        .load_csv(file.path().to_str().unwrap())
        .unwrap();
    assert_eq!(frame.height(), 100);

    let config = ExperimentConfig::new().with_models(vec![
        ModelConfig::default_for(ModelKind::Ols),
        ModelConfig::default_for(ModelKind::Tree),
        ModelConfig::default_for(ModelKind::VotingEnsemble),
    ]);
    let report = listing_hits::run_experiment(
        &frame,
        synthetic_schema(),
        CurationConfig::default().with_min_features(1),
        &config,
    )
    .unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.n_train_rows, 80);
    assert_eq!(report.n_test_rows, 20);
    for result in &report.results {
        assert!(result.metrics.rmse.is_finite());
    }
}

#[test]
fn test_ols_recovers_known_slope() {
    let rows = synthetic_rows(100);
    let frame = polars::prelude::df!(
        "living_space" => rows.iter().map(|(x, _)| *x).collect::<Vec<f64>>(),
        "hits" => rows.iter().map(|(_, y)| *y).collect::<Vec<f64>>()
    )
    .unwrap();

    let curator = Curator::with_config(
        synthetic_schema(),
        CurationConfig::default().with_min_features(1),
    );
    let curated = curator.curate(&frame).unwrap();
    let splits = Preprocessor::with_config(PreprocessConfig::default())
        .prepare(&curated)
        .unwrap();

    let mut model = OlsRegression::new(Default::default());
    model.fit(&splits.x_train, &splits.y_train).unwrap();

    // The matrix is min-max scaled, so the fitted coefficient is the
    // original-unit slope times the fitted column span.
    let (min, max) = splits.scaler.column_range(0).unwrap();
    let slope = model.coefficients().unwrap()[0] / (max - min);
    assert!((slope - 2.0).abs() < 0.1, "recovered slope {}", slope);

    // Held-out error stays within the noise floor.
    let predictions = model.predict(&splits.x_test).unwrap();
    let rmse = listing_hits::rmse(&predictions, &splits.y_test).unwrap();
    assert!(rmse < 2.0 * NOISE_STD, "held-out rmse {}", rmse);
}

#[test]
fn test_all_variants_fit_and_predict() {
    let rows = synthetic_rows(60);
    let n = rows.len();
    let mut x = Array2::zeros((n, 1));
    let mut y = ndarray::Array1::zeros(n);
    for (i, (xi, yi)) in rows.iter().enumerate() {
        // Pre-scale into [0,1] so every variant sees well-conditioned input.
        x[[i, 0]] = xi / 1000.0;
        y[i] = *yi;
    }

    for kind in [
        ModelKind::Ols,
        ModelKind::PoissonGlm,
        ModelKind::Tree,
        ModelKind::RandomForest,
        ModelKind::Svr,
        ModelKind::Mlp,
        ModelKind::VotingEnsemble,
    ] {
        let model = fit_model(&ModelConfig::default_for(kind), &x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.len(), n, "{:?} prediction length", kind);
        assert!(
            pred.iter().all(|v| v.is_finite()),
            "{:?} produced non-finite predictions",
            kind
        );
    }
}
