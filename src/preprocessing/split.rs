//! Seeded train/test row partitioning

use crate::error::{ListingError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Row-index partition produced by a seeded shuffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `0..n_rows` into train and test index sets.
///
/// The assignment is a deterministic function of `(n_rows, test_fraction,
/// seed)`: the same inputs always yield the same partition. Both partitions
/// must end up non-empty.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(ListingError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must lie strictly between 0 and 1".to_string(),
        });
    }

    let n_test = ((n_rows as f64) * test_fraction).round() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(ListingError::Preprocessing(format!(
            "split of {} rows at fraction {} leaves an empty partition",
            n_rows, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(100, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_test_split(50, 0.2, 7).unwrap();
        let mut all: Vec<usize> = split
            .train
            .iter()
            .chain(split.test.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let a = train_test_split(200, 0.2, 42).unwrap();
        let b = train_test_split(200, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = train_test_split(200, 0.2, 1).unwrap();
        let b = train_test_split(200, 0.2, 2).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn test_degenerate_fraction_rejected() {
        assert!(train_test_split(100, 0.0, 42).is_err());
        assert!(train_test_split(100, 1.0, 42).is_err());
        assert!(train_test_split(3, 0.01, 42).is_err());
    }
}
