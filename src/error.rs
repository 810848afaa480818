//! Error types for surrogate model construction
//!
//! This module defines the failure modes encountered when partitioning data,
//! fitting least-squares surrogates, selecting a degree, or reading and writing
//! tables, along with a convenient `Result` alias.
//!
//! Top-level entry points wrap failures in [`Error::Stage`] so callers can tell
//! which stage failed; [`Error::kind`] looks through that wrapper.

/// Errors that can occur while building or evaluating a surrogate model.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cannot build a model because there is no data.
    #[error("No data available for fitting")]
    NoData,

    /// Input rows have inconsistent or empty parameter vectors.
    #[error("Invalid input dimension: {0}")]
    InvalidDimension(String),

    /// The fold count is outside `2..=n`.
    #[error("Cannot split {n} observations into {folds} folds; expected 2 <= folds <= {n}")]
    InvalidFoldCount {
        /// Requested number of folds
        folds: usize,
        /// Number of observations
        n: usize,
    },

    /// A degree, or the candidate degree range, is not usable.
    #[error("Invalid degree: {0}")]
    InvalidDegree(String),

    /// The cross-validation search needs at least one epoch.
    #[error("Epoch count must be at least 1, got {0}")]
    InvalidEpochCount(usize),

    /// The normal-equations matrix `XᵀX` is not invertible.
    ///
    /// Usually the degree is too high for the amount of data, or the inputs are collinear.
    #[error(
        "Design matrix (X^T X) is not invertible; the data may be insufficient or collinear. [n: {n}, k: {k}]"
    )]
    SingularDesignMatrix {
        /// Number of observations
        n: usize,
        /// Number of monomials
        k: usize,
    },

    /// Degree selection finished without a single usable candidate.
    #[error("None of the candidate degrees could be fitted")]
    NoModel,

    /// The cross-validation search ran past its configured time limit.
    #[error("Cross-validation exceeded its time limit after {completed} fits")]
    DeadlineExceeded {
        /// Number of fold fits completed before the deadline
        completed: usize,
    },

    /// A numeric value could not be cast to the target type.
    #[error("Failed to cast value to target type")]
    CastFailed,

    /// A named column is not present in a table.
    #[error("Column `{0}` not found")]
    MissingColumn(String),

    /// A table cell could not be parsed as a number.
    #[error("Row {row}, column `{column}`: cannot parse `{value}` as a number")]
    ParseValue {
        /// 1-based data row (header excluded)
        row: usize,
        /// Column name
        column: String,
        /// Raw cell contents
        value: String,
    },

    /// CSV reader or writer failure.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error annotated with the stage of the pipeline it came from.
    #[error("{stage} failed: {source}")]
    Stage {
        /// Stage that failed
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Annotates this error with a pipeline stage.
    ///
    /// An error that already carries a stage is returned unchanged, so the innermost
    /// (most specific) stage wins.
    #[must_use]
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Returns the stage this error was annotated with, if any.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the kind of failure, looking through any stage annotation.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoData => ErrorKind::NoData,
            Error::InvalidDimension(_) => ErrorKind::InvalidDimension,
            Error::InvalidFoldCount { .. } => ErrorKind::InvalidFoldCount,
            Error::InvalidDegree(_) => ErrorKind::InvalidDegree,
            Error::InvalidEpochCount(_) => ErrorKind::InvalidEpochCount,
            Error::SingularDesignMatrix { .. } => ErrorKind::SingularDesignMatrix,
            Error::NoModel => ErrorKind::NoModel,
            Error::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Error::CastFailed => ErrorKind::CastFailed,
            Error::MissingColumn(_) => ErrorKind::MissingColumn,
            Error::ParseValue { .. } => ErrorKind::ParseValue,
            Error::Csv(_) => ErrorKind::Csv,
            Error::Io(_) => ErrorKind::Io,
            Error::Stage { source, .. } => source.kind(),
        }
    }
}

/// Discriminant of [`Error`], independent of any stage annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorKind {
    NoData,
    InvalidDimension,
    InvalidFoldCount,
    InvalidDegree,
    InvalidEpochCount,
    SingularDesignMatrix,
    NoModel,
    DeadlineExceeded,
    CastFailed,
    MissingColumn,
    ParseValue,
    Csv,
    Io,
}

/// Pipeline stage reported by [`Error::Stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Checking inputs and configuration before any work is done
    Validation,
    /// Drawing the random fold partition
    Partitioning,
    /// Fitting least-squares coefficients
    Fitting,
    /// Cross-validated degree search
    Selection,
    /// Evaluating the surrogate on new points
    Evaluation,
    /// Loading a table
    Reading,
    /// Writing predictions
    Writing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Partitioning => "partitioning",
            Stage::Fitting => "fitting",
            Stage::Selection => "degree selection",
            Stage::Evaluation => "evaluation",
            Stage::Reading => "reading",
            Stage::Writing => "writing",
        };
        f.write_str(name)
    }
}

/// Result type for surrogate model construction
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_sees_through_stage() {
        let err = Error::SingularDesignMatrix { n: 3, k: 6 }.in_stage(Stage::Fitting);
        assert_eq!(err.kind(), ErrorKind::SingularDesignMatrix);
        assert_eq!(err.stage(), Some(Stage::Fitting));
    }

    #[test]
    fn test_innermost_stage_wins() {
        let err = Error::InvalidFoldCount { folds: 5, n: 3 }
            .in_stage(Stage::Partitioning)
            .in_stage(Stage::Selection);
        assert_eq!(err.stage(), Some(Stage::Partitioning));
        assert_eq!(err.kind(), ErrorKind::InvalidFoldCount);
    }

    #[test]
    fn test_display_mentions_stage() {
        let err = Error::NoData.in_stage(Stage::Reading);
        assert_eq!(err.to_string(), "reading failed: No data available for fitting");
        assert!(Error::NoData.stage().is_none());
    }
}
