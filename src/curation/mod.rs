//! Data curation
//!
//! Turns the raw listing table into a fixed-schema curated table: sentinel
//! missing codes become explicit nulls before any statistic is computed,
//! unusable columns are dropped, and the remaining missing cells are imputed
//! (mode for counts and flags, mean for continuous costs). The curated
//! output carries no nulls; violating that is a bug, not a warning.

use crate::error::{ListingError, Result};
use crate::schema::{FeatureKind, FeatureSchema};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Curation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Numeric codes the provider uses for "missing" (swept to null first)
    pub numeric_sentinels: Vec<f64>,
    /// String codes the provider uses for "missing"
    pub string_sentinels: Vec<String>,
    /// Drop a column when its missing fraction exceeds this
    pub max_missing_fraction: f64,
    /// Columns that describe the ad, not the listing (dropped outright)
    pub metadata_columns: Vec<String>,
    /// Fail curation when fewer features than this survive
    pub min_features: usize,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            numeric_sentinels: vec![-1.0],
            string_sentinels: vec!["NO_INFORMATION".to_string()],
            max_missing_fraction: 0.4,
            metadata_columns: Vec::new(),
            min_features: 10,
        }
    }
}

impl CurationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric_sentinels(mut self, sentinels: Vec<f64>) -> Self {
        self.numeric_sentinels = sentinels;
        self
    }

    pub fn with_string_sentinels(mut self, sentinels: Vec<String>) -> Self {
        self.string_sentinels = sentinels;
        self
    }

    pub fn with_max_missing_fraction(mut self, fraction: f64) -> Self {
        self.max_missing_fraction = fraction;
        self
    }

    pub fn with_metadata_columns(mut self, columns: Vec<String>) -> Self {
        self.metadata_columns = columns;
        self
    }

    pub fn with_min_features(mut self, n: usize) -> Self {
        self.min_features = n;
        self
    }
}

/// Curated table: fixed-schema frame with zero nulls.
#[derive(Debug, Clone)]
pub struct CuratedTable {
    pub frame: DataFrame,
    pub schema: FeatureSchema,
}

/// Data curator.
#[derive(Debug, Clone)]
pub struct Curator {
    config: CurationConfig,
    schema: FeatureSchema,
}

impl Curator {
    /// Create a curator for the given target schema with default settings.
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            config: CurationConfig::default(),
            schema,
        }
    }

    /// Create a curator with custom settings.
    pub fn with_config(schema: FeatureSchema, config: CurationConfig) -> Self {
        Self { config, schema }
    }

    /// Curate the raw table into a fixed-schema, fully imputed table.
    pub fn curate(&self, raw: &DataFrame) -> Result<CuratedTable> {
        self.schema.validate_frame(raw)?;

        // Sweep sentinels to nulls before any statistic sees them.
        let mut df = self.normalize_missing(raw)?;

        // Decide which feature columns survive.
        let mut retained: Vec<String> = Vec::new();
        for col in self.schema.features() {
            if self.config.metadata_columns.contains(&col.name) {
                info!("dropping column '{}': listed as metadata", col.name);
                continue;
            }
            let series = df.column(&col.name)?.as_materialized_series().clone();
            let missing_fraction = series.null_count() as f64 / series.len().max(1) as f64;
            if missing_fraction > self.config.max_missing_fraction {
                info!(
                    "dropping column '{}': {:.1}% missing",
                    col.name,
                    missing_fraction * 100.0
                );
                continue;
            }
            let distinct = series
                .drop_nulls()
                .n_unique()
                .map_err(|e| ListingError::Curation(e.to_string()))?;
            if distinct <= 1 {
                info!("dropping column '{}': constant across all rows", col.name);
                continue;
            }
            retained.push(col.name.clone());
        }

        if retained.len() < self.config.min_features {
            return Err(ListingError::InsufficientFeatures {
                retained: retained.len(),
                required: self.config.min_features,
            });
        }

        let schema = self.schema.restrict_to(&retained);

        // Impute the surviving columns.
        for col in schema.features() {
            let filled = self.impute_column(&df, &col.name, col.kind)?;
            df = df.with_column(filled)?.clone();
        }

        // The target is never imputed: missing targets are a data error.
        let target = df.column(schema.target())?.as_materialized_series();
        if target.null_count() > 0 {
            return Err(ListingError::Data(format!(
                "target column '{}' has {} missing values",
                schema.target(),
                target.null_count()
            )));
        }

        // Fixed column order: schema features, then target.
        let mut selection: Vec<&str> = retained.iter().map(|s| s.as_str()).collect();
        selection.push(schema.target());
        let frame = df.select(selection)?;

        let residual_nulls: usize = frame.get_columns().iter().map(|c| c.null_count()).sum();
        if residual_nulls > 0 {
            return Err(ListingError::Curation(format!(
                "{} nulls remain after imputation",
                residual_nulls
            )));
        }

        debug!(
            "curated {} rows, {} features + target",
            frame.height(),
            schema.len()
        );
        Ok(CuratedTable { frame, schema })
    }

    /// Replace sentinel codes with nulls and cast numeric columns to f64.
    fn normalize_missing(&self, raw: &DataFrame) -> Result<DataFrame> {
        let mut df = raw.clone();

        for col in self.schema.features() {
            let series = df.column(&col.name)?.as_materialized_series().clone();
            let cleaned = match col.kind {
                FeatureKind::Categorical => {
                    let ca = series
                        .str()
                        .map_err(|e| ListingError::Curation(e.to_string()))?;
                    let swept: StringChunked = ca
                        .into_iter()
                        .map(|opt| {
                            opt.filter(|v| !self.config.string_sentinels.iter().any(|s| s == v))
                        })
                        .collect();
                    swept.with_name(series.name().clone()).into_series()
                }
                _ => {
                    let casted = series
                        .cast(&DataType::Float64)
                        .map_err(|e| ListingError::Curation(e.to_string()))?;
                    let ca = casted
                        .f64()
                        .map_err(|e| ListingError::Curation(e.to_string()))?;
                    let swept: Float64Chunked = ca
                        .into_iter()
                        .map(|opt| {
                            opt.filter(|v| {
                                !self
                                    .config
                                    .numeric_sentinels
                                    .iter()
                                    .any(|s| (s - v).abs() < f64::EPSILON)
                            })
                        })
                        .collect();
                    swept.with_name(series.name().clone()).into_series()
                }
            };
            df = df.with_column(cleaned)?.clone();
        }

        // Target joins the numeric side unchanged apart from the f64 cast.
        let target = df
            .column(self.schema.target())?
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| ListingError::Curation(e.to_string()))?;
        df = df.with_column(target)?.clone();

        Ok(df)
    }

    /// Fill missing cells using the kind's statistic over non-missing cells.
    fn impute_column(&self, df: &DataFrame, name: &str, kind: FeatureKind) -> Result<Series> {
        let series = df.column(name)?.as_materialized_series();

        if series.null_count() == series.len() {
            return Err(ListingError::Curation(format!(
                "column '{}' is entirely missing after filtering",
                name
            )));
        }

        match kind {
            FeatureKind::Categorical => {
                let ca = series
                    .str()
                    .map_err(|e| ListingError::Curation(e.to_string()))?;
                let fill = string_mode(ca).ok_or_else(|| {
                    ListingError::Curation(format!("no mode for column '{}'", name))
                })?;
                let filled = ca
                    .set(&ca.is_null(), Some(fill.as_str()))
                    .map_err(|e| ListingError::Curation(e.to_string()))?;
                Ok(filled.into_series())
            }
            FeatureKind::Count | FeatureKind::Binary => {
                let ca = series
                    .f64()
                    .map_err(|e| ListingError::Curation(e.to_string()))?;
                let fill = numeric_mode(ca).ok_or_else(|| {
                    ListingError::Curation(format!("no mode for column '{}'", name))
                })?;
                self.fill_numeric(series, fill)
            }
            FeatureKind::Cost => {
                let mean = series
                    .f64()
                    .map_err(|e| ListingError::Curation(e.to_string()))?
                    .mean()
                    .ok_or_else(|| {
                        ListingError::Curation(format!("no mean for column '{}'", name))
                    })?;
                self.fill_numeric(series, mean)
            }
        }
    }

    fn fill_numeric(&self, series: &Series, value: f64) -> Result<Series> {
        let filled = series
            .f64()
            .map_err(|e| ListingError::Curation(e.to_string()))?
            .fill_null_with_values(value)
            .map_err(|e| ListingError::Curation(e.to_string()))?;
        Ok(filled.into_series())
    }
}

/// Most frequent non-null value; ties break toward the smallest value.
fn numeric_mode(ca: &Float64Chunked) -> Option<f64> {
    let mut counts: std::collections::HashMap<u64, (f64, usize)> = std::collections::HashMap::new();
    for v in ca.into_iter().flatten() {
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    counts
        .into_values()
        .max_by(|(va, ca), (vb, cb)| {
            ca.cmp(cb).then(
                vb.partial_cmp(va)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        })
        .map(|(v, _)| v)
}

/// Most frequent non-null string; ties break lexicographically.
fn string_mode(ca: &StringChunked) -> Option<String> {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for v in ca.into_iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then(sb.cmp(sa)))
        .map(|(s, _)| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_schema() -> FeatureSchema {
        FeatureSchema::new(
            vec![
                ("no_rooms", FeatureKind::Count),
                ("base_rent", FeatureKind::Cost),
                ("ad_period", FeatureKind::Categorical),
            ],
            "hits",
        )
    }

    fn raw_frame() -> DataFrame {
        df!(
            "no_rooms" => &[2.0, 3.0, -1.0, 2.0, 2.0],
            "base_rent" => &[450.0, 780.0, 320.0, -1.0, 600.0],
            "ad_period" => &["May19", "May19", "NO_INFORMATION", "Oct19", "Oct19"],
            "hits" => &[112.0, 87.0, 240.0, 55.0, 130.0]
        )
        .unwrap()
    }

    #[test]
    fn test_sentinels_become_imputed_values() {
        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        let curated = curator.curate(&raw_frame()).unwrap();

        // No nulls anywhere
        let nulls: usize = curated
            .frame
            .get_columns()
            .iter()
            .map(|c| c.null_count())
            .sum();
        assert_eq!(nulls, 0);

        // The -1.0 room sentinel was replaced by the mode (2.0), not left in
        let rooms = curated.frame.column("no_rooms").unwrap().f64().unwrap();
        assert_eq!(rooms.get(2), Some(2.0));

        // The -1.0 rent sentinel was replaced by the mean of the rest
        let rent = curated.frame.column("base_rent").unwrap().f64().unwrap();
        let expected_mean = (450.0 + 780.0 + 320.0 + 600.0) / 4.0;
        assert!((rent.get(3).unwrap() - expected_mean).abs() < 1e-9);
    }

    #[test]
    fn test_sentinel_excluded_from_statistics() {
        // If the sentinel leaked into the mean it would drag it down.
        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        let curated = curator.curate(&raw_frame()).unwrap();
        let rent = curated.frame.column("base_rent").unwrap().f64().unwrap();
        assert!(rent.get(3).unwrap() > 500.0);
    }

    #[test]
    fn test_high_missingness_column_dropped() {
        let df = df!(
            "no_rooms" => &[-1.0, -1.0, -1.0, 2.0, 3.0],
            "base_rent" => &[450.0, 780.0, 320.0, 500.0, 600.0],
            "ad_period" => &["May19", "Oct19", "May19", "Oct19", "May19"],
            "hits" => &[112.0, 87.0, 240.0, 55.0, 130.0]
        )
        .unwrap();

        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        let curated = curator.curate(&df).unwrap();
        assert!(curated.schema.kind_of("no_rooms").is_none());
        assert!(curated.frame.column("no_rooms").is_err());
    }

    #[test]
    fn test_constant_column_dropped() {
        let df = df!(
            "no_rooms" => &[2.0, 2.0, 2.0, 2.0, 2.0],
            "base_rent" => &[450.0, 780.0, 320.0, 500.0, 600.0],
            "ad_period" => &["May19", "Oct19", "May19", "Oct19", "May19"],
            "hits" => &[112.0, 87.0, 240.0, 55.0, 130.0]
        )
        .unwrap();

        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        let curated = curator.curate(&df).unwrap();
        assert!(curated.schema.kind_of("no_rooms").is_none());
    }

    #[test]
    fn test_metadata_column_dropped() {
        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default()
                .with_min_features(2)
                .with_metadata_columns(vec!["no_rooms".to_string()]),
        );
        let curated = curator.curate(&raw_frame()).unwrap();
        assert!(curated.schema.kind_of("no_rooms").is_none());
    }

    #[test]
    fn test_too_few_features_fails_loudly() {
        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(5),
        );
        let result = curator.curate(&raw_frame());
        assert!(matches!(
            result,
            Err(ListingError::InsufficientFeatures { .. })
        ));
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let df = df!(
            "no_rooms" => &[2.0, 3.0, 2.0],
            "base_rent" => &[450.0, 780.0, 320.0],
            "ad_period" => &["May19", "Oct19", "May19"],
            "hits" => &[Some(112.0), None, Some(240.0)]
        )
        .unwrap();

        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        assert!(matches!(curator.curate(&df), Err(ListingError::Data(_))));
    }

    #[test]
    fn test_curation_idempotent() {
        let curator = Curator::with_config(
            small_schema(),
            CurationConfig::default().with_min_features(2),
        );
        let once = curator.curate(&raw_frame()).unwrap();
        let twice = Curator::with_config(
            once.schema.clone(),
            CurationConfig::default().with_min_features(2),
        )
        .curate(&once.frame)
        .unwrap();
        assert_eq!(once.frame.height(), twice.frame.height());
        let nulls: usize = twice
            .frame
            .get_columns()
            .iter()
            .map(|c| c.null_count())
            .sum();
        assert_eq!(nulls, 0);
    }
}
