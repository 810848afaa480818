//! Degree selection by repeated k-fold cross-validation
//!
//! For each epoch a fresh [`FoldPartition`] is drawn over the full observation set. Every
//! candidate degree is then fitted once per fold on all other rows and scored on the held-out
//! fold by the squared L2 norm of its residuals. Scores accumulate across folds and epochs, and
//! the degree with the lowest total wins. Ties go to the lowest degree.
//!
//! Candidate degrees that hit a singular design matrix are handled according to the
//! [`SingularPolicy`].
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result, Stage},
    fit::least_squares,
    observations::Observations,
    partition::{FoldPartition, RandomSource},
    value::Value,
};

/// Inclusive range of candidate degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeRange {
    /// Lowest candidate degree
    pub min: usize,

    /// Highest candidate degree
    pub max: usize,
}
impl DegreeRange {
    /// Creates a range of candidate degrees.
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Checks that the range holds at least one degree.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDegree`] if `min > max`.
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InvalidDegree(format!(
                "empty degree range {}..={}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Iterates over the candidate degrees in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.min..=self.max
    }

    /// Number of candidate degrees.
    #[must_use]
    pub fn len(&self) -> usize {
        (self.max + 1).saturating_sub(self.min)
    }

    /// True if the range holds no degree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Parses a polynomial degree from text.
///
/// # Errors
/// Returns [`Error::InvalidDegree`] if `s` is not an integer, or is negative.
pub fn parse_degree(s: &str) -> Result<usize> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| Error::InvalidDegree(format!("`{s}` is not an integer")))?;
    usize::try_from(value).map_err(|_| Error::InvalidDegree(format!("{value} is negative")))
}

impl Default for DegreeRange {
    fn default() -> Self {
        Self { min: 1, max: 9 }
    }
}

impl From<std::ops::RangeInclusive<usize>> for DegreeRange {
    fn from(range: std::ops::RangeInclusive<usize>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

/// What to do when a candidate degree produces a singular design matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SingularPolicy {
    /// Reject the degree for the rest of the search and keep going.
    #[default]
    SkipDegree,

    /// Stop the search and return the error.
    Abort,
}

/// How held-out errors are combined into a degree's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Aggregation {
    /// Plain sum of every fold's SSE.
    ///
    /// The last fold of a partition can be larger than the others, so it weighs more.
    #[default]
    Sum,

    /// Each fold's SSE is divided by its number of held-out rows before summing.
    MeanPerObservation,
}

/// Cross-validation score of one candidate degree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeScore<T: Value = f64> {
    /// Candidate degree
    pub degree: usize,

    /// Held-out error, aggregated over every fold and epoch. Infinite if rejected.
    pub sse: T,

    /// Number of held-out fits that contributed to `sse`
    pub fits: usize,

    /// `sse / fits`. Infinite if rejected.
    pub mean_sse: T,

    /// True if a fit was singular and the degree was excluded
    pub rejected: bool,
}
impl<T: Value> DegreeScore<T> {
    fn new(degree: usize) -> Self {
        Self {
            degree,
            sse: T::zero(),
            fits: 0,
            mean_sse: T::zero(),
            rejected: false,
        }
    }

    fn reject(&mut self) {
        self.rejected = true;
        self.sse = T::infinity();
        self.mean_sse = T::infinity();
    }
}

/// Outcome of a cross-validated degree search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeSelection<T: Value = f64> {
    /// Degree with the lowest aggregated held-out error
    pub degree: usize,

    /// Aggregated held-out error of the selected degree
    pub sse: T,

    /// Scores for every candidate, in ascending degree order
    pub scores: Vec<DegreeScore<T>>,
}
impl<T: Value> DegreeSelection<T> {
    /// Returns the score for `degree`, if it was a candidate.
    #[must_use]
    pub fn score(&self, degree: usize) -> Option<&DegreeScore<T>> {
        self.scores.iter().find(|s| s.degree == degree)
    }
}

/// Configuration of the cross-validated degree search.
///
/// # Example
/// ```rust
/// use polysurrogate::{selection::CrossValidation, test::synthetic_observations};
///
/// let data = synthetic_observations(1, 60, -1.0..=1.0, 0.01, Some(1), |x| 1.0 - x[0] * x[0]);
///
/// let selection = CrossValidation::default()
///     .with_epochs(2)
///     .with_folds(5)
///     .with_degrees(1..=4)
///     .with_seed(7)
///     .select_degree(&data)
///     .unwrap();
///
/// assert_eq!(selection.scores.len(), 4);
/// assert!(selection.score(1).unwrap().sse > selection.sse);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidation {
    /// Number of independent partitions to average over. At least 1.
    pub epochs: usize,

    /// Number of folds per partition. Between 2 and the number of observations.
    pub folds: usize,

    /// Candidate degrees
    pub degrees: DegreeRange,

    /// Source of the partition randomness
    pub random: RandomSource,

    /// Handling of singular fits
    pub singular_policy: SingularPolicy,

    /// Handling of fold sizes when combining held-out errors
    pub aggregation: Aggregation,

    /// Optional wall-clock limit for the whole search
    pub time_limit: Option<Duration>,
}

impl Default for CrossValidation {
    fn default() -> Self {
        Self {
            epochs: 2,
            folds: 10,
            degrees: DegreeRange::default(),
            random: RandomSource::default(),
            singular_policy: SingularPolicy::default(),
            aggregation: Aggregation::default(),
            time_limit: None,
        }
    }
}

/// Training and held-out rows for one fold.
struct FoldData<T: Value> {
    training: Observations<T>,
    held_out: Observations<T>,
}

impl CrossValidation {
    /// Sets the number of epochs.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the number of folds.
    #[must_use]
    pub fn with_folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }

    /// Sets the candidate degrees.
    #[must_use]
    pub fn with_degrees(mut self, degrees: impl Into<DegreeRange>) -> Self {
        self.degrees = degrees.into();
        self
    }

    /// Sets the random source.
    #[must_use]
    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Shortcut for [`RandomSource::Seeded`].
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_random(RandomSource::Seeded(seed))
    }

    /// Sets the singular fit policy.
    #[must_use]
    pub fn with_singular_policy(mut self, policy: SingularPolicy) -> Self {
        self.singular_policy = policy;
        self
    }

    /// Sets the error aggregation.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Sets a wall-clock limit for the search.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Checks the configuration against a data set of `n` observations.
    ///
    /// # Errors
    /// - [`Error::InvalidEpochCount`] if `epochs` is 0.
    /// - [`Error::InvalidDegree`] if the degree range is empty.
    /// - [`Error::InvalidFoldCount`] unless `2 <= folds <= n`.
    pub fn validate(&self, n: usize) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidEpochCount(self.epochs));
        }
        self.degrees.validate()?;
        FoldPartition::validate(n, self.folds)
    }

    /// Runs the search and returns the best degree along with every candidate's score.
    ///
    /// Every epoch draws a new partition from one random stream created at the start of the
    /// call, so a [`RandomSource::Seeded`] search is reproducible.
    ///
    /// <div class="warning">
    ///
    /// **Technical Details**
    ///
    /// ```math
    /// SSE(D) = Σ_epochs Σ_folds ‖z_i - f_D,-i(x_i)‖²
    /// where
    ///   f_D,-i = degree D surrogate fitted without fold i
    ///   x_i, z_i = inputs and responses of fold i
    /// ```
    /// </div>
    ///
    /// # Errors
    /// - Configuration errors from [`CrossValidation::validate`], in the `Validation` stage.
    /// - [`Error::SingularDesignMatrix`] under [`SingularPolicy::Abort`], in the `Selection` stage.
    /// - [`Error::NoModel`] if every candidate was rejected.
    /// - [`Error::DeadlineExceeded`] if the time limit runs out.
    pub fn select_degree<T: Value>(
        &self,
        observations: &Observations<T>,
    ) -> Result<DegreeSelection<T>> {
        let n = observations.len();
        self.validate(n)
            .map_err(|e| e.in_stage(Stage::Validation))?;

        let started = Instant::now();
        let deadline = self.time_limit.map(|limit| started + limit);
        let mut rng = self.random.rng();
        let mut scores: Vec<DegreeScore<T>> = self.degrees.iter().map(DegreeScore::new).collect();
        let mut completed = 0;

        for epoch in 0..self.epochs {
            let partition = FoldPartition::random(n, self.folds, &mut rng)
                .map_err(|e| e.in_stage(Stage::Partitioning))?;
            let folds = Self::realize(observations, &partition)?;
            log::debug!("epoch {epoch}: partitioned {n} observations into {} folds", folds.len());

            #[cfg(not(feature = "parallel"))]
            for score in scores.iter_mut().filter(|s| !s.rejected) {
                let trial = self.score_degree(score.degree, &folds, deadline);
                self.record(score, trial, &mut completed)?;
            }

            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                let trials: Vec<_> = scores
                    .par_iter()
                    .map(|score| {
                        (!score.rejected).then(|| self.score_degree(score.degree, &folds, deadline))
                    })
                    .collect();
                for (score, trial) in scores.iter_mut().zip(trials) {
                    if let Some(trial) = trial {
                        self.record(score, trial, &mut completed)?;
                    }
                }
            }
        }

        for score in scores.iter_mut().filter(|s| !s.rejected) {
            score.mean_sse = score.sse / T::from_positive_int(score.fits);
        }

        let mut best: Option<&DegreeScore<T>> = None;
        for score in scores.iter().filter(|s| !s.rejected) {
            if best.map_or(true, |b| score.sse < b.sse) {
                best = Some(score);
            }
        }

        let Some(best) = best else {
            return Err(Error::NoModel.in_stage(Stage::Selection));
        };
        let (degree, sse) = (best.degree, best.sse);

        log::info!(
            "selected degree {degree} (held-out SSE {sse:e}) after {completed} fits in {:?}",
            started.elapsed()
        );
        Ok(DegreeSelection {
            degree,
            sse,
            scores,
        })
    }

    /// Splits the observations into training and held-out sets for every fold.
    fn realize<T: Value>(
        observations: &Observations<T>,
        partition: &FoldPartition,
    ) -> Result<Vec<FoldData<T>>> {
        (0..partition.len())
            .map(|i| {
                Ok(FoldData {
                    training: observations.select(&partition.training_indices(i))?,
                    held_out: observations.select(partition.fold(i))?,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_stage(Stage::Partitioning))
    }

    /// Fits `degree` on every fold and returns the aggregated held-out error with the number
    /// of fits it covers.
    ///
    /// A failed fit ends the trial; `DeadlineExceeded` carries the number of fits done so far.
    fn score_degree<T: Value>(
        &self,
        degree: usize,
        folds: &[FoldData<T>],
        deadline: Option<Instant>,
    ) -> Result<(T, usize)> {
        let mut total = T::zero();
        for (i, fold) in folds.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Error::DeadlineExceeded { completed: i });
            }

            let fit = least_squares(&fold.training, degree)?;
            let sse = fit.sum_squared_error(&fold.held_out)?;
            total += match self.aggregation {
                Aggregation::Sum => sse,
                Aggregation::MeanPerObservation => sse / T::from_positive_int(fold.held_out.len()),
            };
        }

        log::debug!("degree {degree}: held-out SSE {total:e} over {} folds", folds.len());
        Ok((total, folds.len()))
    }

    /// Folds one trial into the running score of its degree, applying the singular policy.
    fn record<T: Value>(
        &self,
        score: &mut DegreeScore<T>,
        trial: Result<(T, usize)>,
        completed: &mut usize,
    ) -> Result<()> {
        match trial {
            Ok((sse, fits)) => {
                score.sse += sse;
                score.fits += fits;
                *completed += fits;
                Ok(())
            }

            Err(e @ Error::SingularDesignMatrix { .. }) => match self.singular_policy {
                SingularPolicy::SkipDegree => {
                    log::warn!("rejecting degree {}: {e}", score.degree);
                    score.reject();
                    Ok(())
                }
                SingularPolicy::Abort => Err(e.in_stage(Stage::Selection)),
            },

            Err(Error::DeadlineExceeded { completed: partial }) => {
                Err(Error::DeadlineExceeded {
                    completed: *completed + partial,
                }
                .in_stage(Stage::Selection))
            }

            Err(e) => Err(e.in_stage(Stage::Selection)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, test::synthetic_observations, value::SteppedValues};

    /// `z = 1 + 2x - 3x²` sampled twice at each point of a grid over `[-1, 1]`, once `+δ` and
    /// once `-δ`.
    ///
    /// The paired noise cancels in every column of the full design matrix, so no degree above 2
    /// can explain any of it.
    fn paired_quadratic() -> Observations<f64> {
        let mut inputs = Vec::new();
        let mut responses = Vec::new();
        for x in SteppedValues::new(-1.0..=1.0, 0.05) {
            let z = 1.0 + 2.0 * x - 3.0 * x * x;
            for delta in [0.05, -0.05] {
                inputs.push(vec![x]);
                responses.push(z + delta);
            }
        }
        Observations::new(inputs, responses).unwrap()
    }

    #[test]
    fn test_selects_quadratic() {
        let data = paired_quadratic();
        let selection = CrossValidation::default()
            .with_epochs(3)
            .with_folds(5)
            .with_seed(2024)
            .select_degree(&data)
            .unwrap();

        assert_eq!(selection.degree, 2);
        assert_eq!(selection.scores.len(), 9);
        assert!(selection.scores.iter().all(|s| !s.rejected));
        assert!(selection.scores.iter().all(|s| s.fits == 15));
    }

    #[test]
    fn test_mean_aggregation_selects_quadratic() {
        let data = paired_quadratic();
        let selection = CrossValidation::default()
            .with_epochs(2)
            .with_folds(7)
            .with_seed(5)
            .with_aggregation(Aggregation::MeanPerObservation)
            .select_degree(&data)
            .unwrap();
        assert_eq!(selection.degree, 2);
    }

    #[test]
    fn test_gaussian_noise_quadratic() {
        // z = 1 + 2x - 3x² with σ = 0.05
        let data = synthetic_observations(1, 200, -1.0..=1.0, 0.05, Some(17), |x| {
            1.0 + 2.0 * x[0] - 3.0 * x[0] * x[0]
        });
        let selection = CrossValidation::default()
            .with_epochs(3)
            .with_folds(5)
            .with_seed(17)
            .select_degree(&data)
            .unwrap();

        // Terms above degree 2 can only chase noise, so they never pay off by much
        let quadratic = selection.score(2).unwrap().sse;
        assert!(selection.degree >= 2);
        assert!(quadratic <= selection.sse * 1.05, "{quadratic} vs {}", selection.sse);

        // Below degree 2 the curvature is missed entirely
        assert!(selection.score(1).unwrap().sse > 10.0 * quadratic);
    }

    #[test]
    fn test_wide_table_rejects_high_degrees() {
        // 30 parameters: degree 2 alone needs 496 monomials
        let data = synthetic_observations(30, 50, 0.0..=1.0, 0.01, Some(6), |x| x.iter().sum());
        let selection = CrossValidation::default()
            .with_folds(5)
            .with_seed(6)
            .select_degree(&data)
            .unwrap();

        assert_eq!(selection.degree, 1);
        assert!(selection.scores.iter().skip(1).all(|s| s.rejected));
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let data = synthetic_observations(2, 40, -1.0..=1.0, 0.1, Some(3), |x| x[0] * x[1]);
        let cv = CrossValidation::default()
            .with_folds(4)
            .with_degrees(1..=3)
            .with_seed(11);

        let a = cv.select_degree(&data).unwrap();
        let b = cv.select_degree(&data).unwrap();
        assert_eq!(a, b);
    }

    /// 12 observations over 2 parameters with 3 folds leaves 8 training rows, which cannot
    /// support the 10 monomials of degree 3.
    fn underdetermined_cubic() -> (Observations<f64>, CrossValidation) {
        let data = synthetic_observations(2, 12, 0.0..=1.0, 0.01, Some(8), |x| x[0] + x[1]);
        let cv = CrossValidation::default()
            .with_folds(3)
            .with_degrees(1..=3)
            .with_seed(1);
        (data, cv)
    }

    #[test]
    fn test_skip_policy_never_selects_rejected_degree() {
        let (data, cv) = underdetermined_cubic();
        let selection = cv.select_degree(&data).unwrap();

        let cubic = selection.score(3).unwrap();
        assert!(cubic.rejected);
        assert!(cubic.sse.is_infinite());
        assert_ne!(selection.degree, 3);
    }

    #[test]
    fn test_abort_policy_surfaces_singular_fit() {
        let (data, cv) = underdetermined_cubic();
        let err = cv
            .with_singular_policy(SingularPolicy::Abort)
            .select_degree(&data)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SingularDesignMatrix);
        assert_eq!(err.stage(), Some(Stage::Selection));
    }

    #[test]
    fn test_every_degree_rejected_is_no_model() {
        let (data, cv) = underdetermined_cubic();
        let err = cv.with_degrees(3..=4).select_degree(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoModel);
    }

    #[test]
    fn test_invalid_configuration() {
        let data = paired_quadratic();

        let err = CrossValidation::default()
            .with_epochs(0)
            .select_degree(&data)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEpochCount);
        assert_eq!(err.stage(), Some(Stage::Validation));

        let err = CrossValidation::default()
            .with_degrees(DegreeRange::new(4, 2))
            .select_degree(&data)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDegree);

        let err = CrossValidation::default()
            .with_folds(data.len() + 1)
            .select_degree(&data)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFoldCount);
    }

    #[test]
    fn test_time_limit() {
        let data = paired_quadratic();
        let err = CrossValidation::default()
            .with_time_limit(Duration::ZERO)
            .select_degree(&data)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Stage {
                stage: Stage::Selection,
                ref source,
            } if matches!(**source, Error::DeadlineExceeded { completed: 0 })
        ));
    }

    #[test]
    fn test_degree_range() {
        let range = DegreeRange::default();
        assert_eq!(range.iter().collect::<Vec<_>>(), (1..=9).collect::<Vec<_>>());
        assert_eq!(range.len(), 9);
        assert!(DegreeRange::new(3, 2).is_empty());
        assert_eq!(DegreeRange::from(0..=0).len(), 1);
    }

    #[test]
    fn test_parse_degree() {
        assert_eq!(parse_degree("4").unwrap(), 4);
        assert_eq!(parse_degree(" 0 ").unwrap(), 0);
        assert_eq!(parse_degree("-1").unwrap_err().kind(), ErrorKind::InvalidDegree);
        assert_eq!(parse_degree("two").unwrap_err().kind(), ErrorKind::InvalidDegree);
    }
}
