//! Named feature schema shared by curation, preprocessing, and training.
//!
//! The schema is the contract between pipeline stages: an ordered list of
//! feature columns with semantic kinds, plus the target column. Each stage
//! validates its input frame against the schema instead of relying on
//! implicit column order.

use crate::error::{ListingError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Semantic kind of a feature column.
///
/// The kind decides the imputation statistic (mode for bounded counts and
/// binary flags, mean for continuous costs) and whether the column is
/// eligible for min-max scaling (categorical columns become unscaled
/// one-hot indicators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Bounded integer count (room count, floor, construction year)
    Count,
    /// Continuous monetary or area value
    Cost,
    /// 0/1 flag (balcony, cellar, lift)
    Binary,
    /// String category with a fixed level set
    Categorical,
}

impl FeatureKind {
    /// Whether min-max scaling applies to this kind.
    pub fn is_scalable(self) -> bool {
        !matches!(self, FeatureKind::Categorical)
    }
}

/// One named feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// Ordered feature schema plus target column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<FeatureColumn>,
    target: String,
}

impl FeatureSchema {
    /// Build a schema from `(name, kind)` pairs and a target column.
    pub fn new(features: Vec<(impl Into<String>, FeatureKind)>, target: impl Into<String>) -> Self {
        Self {
            features: features
                .into_iter()
                .map(|(name, kind)| FeatureColumn {
                    name: name.into(),
                    kind,
                })
                .collect(),
            target: target.into(),
        }
    }

    /// The curated apartment-listing schema: 15 features plus the `hits`
    /// target (number of ad views).
    pub fn apartment_listings() -> Self {
        Self::new(
            vec![
                ("service_charge", FeatureKind::Cost),
                ("newly_constructed", FeatureKind::Binary),
                ("balcony", FeatureKind::Binary),
                ("picture_count", FeatureKind::Count),
                ("total_rent", FeatureKind::Cost),
                ("year_constructed", FeatureKind::Count),
                ("has_kitchen", FeatureKind::Binary),
                ("cellar", FeatureKind::Binary),
                ("base_rent", FeatureKind::Cost),
                ("living_space", FeatureKind::Cost),
                ("lift", FeatureKind::Binary),
                ("floor", FeatureKind::Count),
                ("no_rooms", FeatureKind::Count),
                ("garden", FeatureKind::Binary),
                ("ad_period", FeatureKind::Categorical),
            ],
            "hits",
        )
    }

    /// Ordered feature columns.
    pub fn features(&self) -> &[FeatureColumn] {
        &self.features
    }

    /// Target column name.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of feature columns.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Look up the kind of a named feature.
    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        self.features
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
    }

    /// Names of the categorical feature columns.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|c| c.kind == FeatureKind::Categorical)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of the numeric (non-categorical) feature columns, in order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|c| c.kind != FeatureKind::Categorical)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Restrict the schema to features present in `retained`, keeping order.
    pub fn restrict_to(&self, retained: &[String]) -> Self {
        Self {
            features: self
                .features
                .iter()
                .filter(|c| retained.iter().any(|r| r == &c.name))
                .cloned()
                .collect(),
            target: self.target.clone(),
        }
    }

    /// Validate that `df` carries every schema column (features + target).
    pub fn validate_frame(&self, df: &DataFrame) -> Result<()> {
        for col in &self.features {
            if df.column(&col.name).is_err() {
                return Err(ListingError::Schema(format!(
                    "missing feature column '{}'",
                    col.name
                )));
            }
        }
        if df.column(&self.target).is_err() {
            return Err(ListingError::Schema(format!(
                "missing target column '{}'",
                self.target
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apartment_schema_shape() {
        let schema = FeatureSchema::apartment_listings();
        assert_eq!(schema.len(), 15);
        assert_eq!(schema.target(), "hits");
        assert_eq!(schema.categorical_columns(), vec!["ad_period"]);
        assert_eq!(schema.numeric_columns().len(), 14);
    }

    #[test]
    fn test_kind_lookup() {
        let schema = FeatureSchema::apartment_listings();
        assert_eq!(schema.kind_of("no_rooms"), Some(FeatureKind::Count));
        assert_eq!(schema.kind_of("base_rent"), Some(FeatureKind::Cost));
        assert_eq!(schema.kind_of("nonexistent"), None);
    }

    #[test]
    fn test_restrict_preserves_order() {
        let schema = FeatureSchema::apartment_listings();
        let retained = vec!["balcony".to_string(), "service_charge".to_string()];
        let restricted = schema.restrict_to(&retained);
        // Schema order wins over the retained list's order
        assert_eq!(restricted.features()[0].name, "service_charge");
        assert_eq!(restricted.features()[1].name, "balcony");
    }

    #[test]
    fn test_validate_frame_missing_target() {
        let schema = FeatureSchema::new(vec![("a", FeatureKind::Cost)], "y");
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        assert!(matches!(
            schema.validate_frame(&df),
            Err(ListingError::Schema(_))
        ));
    }

    #[test]
    fn test_schema_roundtrip_json() {
        let schema = FeatureSchema::apartment_listings();
        let json = serde_json::to_string(&schema).unwrap();
        let back: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, back);
    }
}
