//! Random k-fold partitions for cross-validation
//!
//! A [`FoldPartition`] splits the indices `0..n` into `k` disjoint folds whose union is the
//! full index set. The first `k - 1` folds each hold `⌊n / k⌋` indices drawn uniformly without
//! replacement from whatever has not been drawn yet; the last fold takes every remaining index,
//! so it holds between `⌊n / k⌋` and `⌊n / k⌋ + k - 1` indices.
//!
//! Randomness is supplied by the caller, see [`RandomSource`].
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the random streams used for fold partitions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RandomSource {
    /// A fresh, OS-seeded stream per call. Results vary between runs.
    #[default]
    Entropy,

    /// A stream seeded with a fixed value. Results are reproducible.
    Seeded(u64),
}
impl RandomSource {
    /// Creates the random number generator for one call.
    #[must_use]
    pub fn rng(self) -> rand::rngs::SmallRng {
        match self {
            RandomSource::Seeded(s) => rand::rngs::SmallRng::seed_from_u64(s),
            RandomSource::Entropy => rand::rngs::SmallRng::from_rng(&mut rand::rng()),
        }
    }
}

impl From<Option<u64>> for RandomSource {
    fn from(seed: Option<u64>) -> Self {
        seed.map_or(RandomSource::Entropy, RandomSource::Seeded)
    }
}

/// `k` disjoint, sorted folds covering `0..n`.
///
/// # Example
/// ```rust
/// use polysurrogate::partition::{FoldPartition, RandomSource};
///
/// let mut rng = RandomSource::Seeded(42).rng();
/// let partition = FoldPartition::random(10, 3, &mut rng).unwrap();
///
/// assert_eq!(partition.len(), 3);
/// assert_eq!(partition.fold(0).len(), 3);
/// assert_eq!(partition.fold(2).len(), 4); // takes the remainder
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPartition {
    n: usize,
    folds: Vec<Vec<usize>>,
}
impl FoldPartition {
    /// Checks that `n` observations can be split into `k` folds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFoldCount`] unless `2 <= k <= n`.
    pub fn validate(n: usize, k: usize) -> Result<()> {
        if k < 2 || k > n {
            return Err(Error::InvalidFoldCount { folds: k, n });
        }
        Ok(())
    }

    /// Draws a random partition of `0..n` into `k` folds.
    ///
    /// Indices within each fold are sorted ascending.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFoldCount`] unless `2 <= k <= n`.
    pub fn random<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Result<Self> {
        Self::validate(n, k)?;

        let fold_size = n / k;
        let mut pool: Vec<usize> = (0..n).collect();
        let mut folds = Vec::with_capacity(k);

        for _ in 0..k - 1 {
            let mut fold: Vec<usize> = rand::seq::index::sample(rng, pool.len(), fold_size)
                .into_iter()
                .map(|p| pool[p])
                .collect();
            fold.sort_unstable();

            pool.retain(|i| fold.binary_search(i).is_err());
            folds.push(fold);
        }

        // Pool is still sorted; it becomes the last fold
        folds.push(pool);

        Ok(Self { n, folds })
    }

    /// Number of folds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    /// Always false; a partition has at least two folds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Number of partitioned indices.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Indices of fold `i`, sorted ascending.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn fold(&self, i: usize) -> &[usize] {
        &self.folds[i]
    }

    /// All folds, in draw order.
    #[must_use]
    pub fn folds(&self) -> &[Vec<usize>] {
        &self.folds
    }

    /// Every index not in fold `i`, sorted ascending.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn training_indices(&self, i: usize) -> Vec<usize> {
        let held_out = &self.folds[i];
        (0..self.n)
            .filter(|j| held_out.binary_search(j).is_err())
            .collect()
    }
}
