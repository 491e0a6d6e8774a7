// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles example indices with a seeded RNG and splits them
// into two disjoint sets:
//   - Training set: used to update model weights
//   - Test set:     used only to measure accuracy on unseen clips
//
// Sizes follow the usual convention:
//   n_test  = ceil(test_fraction * N)
//   n_train = N - n_test
//
// The same seed over the same N always yields the same
// partition, so reruns train and validate on identical clips.
// No stratification: class balance in each half is whatever
// the shuffle produces.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom over a
// StdRng seeded from the configured seed.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Disjoint, exhaustive partition of 0..N.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

impl Split {
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

/// Number of test examples for N items at the given fraction.
pub fn test_count(total: usize, test_fraction: f64) -> usize {
    ((total as f64) * test_fraction).ceil().min(total as f64) as usize
}

/// Shuffle 0..total with `seed` and cut off the test portion.
pub fn split_indices(total: usize, test_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = test_count(total, test_fraction);

    // split_off(n) keeps [0..n] here and returns [n..]
    let train = indices.split_off(n_test);
    let test  = indices;

    tracing::debug!(
        "Dataset split: {} train, {} test ({}% / {}%)",
        train.len(),
        test.len(),
        (train.len() * 100) / total.max(1),
        (test.len()  * 100) / total.max(1),
    );

    Split { train, test }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let split = split_indices(100, 0.2, 42);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(),  20);
    }

    #[test]
    fn test_test_count_rounds_up() {
        assert_eq!(test_count(10, 0.25), 3);
        assert_eq!(test_count(1000, 0.2), 200);
        assert_eq!(test_count(0, 0.2), 0);
    }

    #[test]
    fn test_split_is_disjoint_and_exhaustive() {
        let split = split_indices(57, 0.2, 7);
        assert_eq!(split.total(), 57);

        let train: HashSet<usize> = split.train.iter().copied().collect();
        let test:  HashSet<usize> = split.test.iter().copied().collect();
        assert!(train.is_disjoint(&test));

        let all: HashSet<usize> = train.union(&test).copied().collect();
        assert_eq!(all, (0..57).collect());
    }

    #[test]
    fn test_same_seed_same_partition() {
        assert_eq!(split_indices(500, 0.2, 42), split_indices(500, 0.2, 42));
        assert_ne!(split_indices(500, 0.2, 42), split_indices(500, 0.2, 43));
    }

    #[test]
    fn test_empty_dataset() {
        let split = split_indices(0, 0.2, 42);
        assert!(split.train.is_empty());
        assert!(split.test.is_empty());
    }
}
