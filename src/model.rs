//! Surrogate model construction and evaluation
//!
//! A [`SurrogateModel`] is a coefficient vector over a [`MonomialBasis`]. It is built either at a
//! fixed degree ([`SurrogateModel::fit`]) or at the degree chosen by cross-validation
//! ([`SurrogateModel::construct`]), in which case the final coefficients are refitted on the
//! full training set.
//!
//! [`construct_model`] and [`evaluate`] are flat shortcuts over the same machinery.
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::{
    basis::MonomialBasis,
    display::PolynomialDisplay,
    error::{Error, Result, Stage},
    fit::{least_squares, LeastSquaresFit},
    observations::Observations,
    selection::{CrossValidation, DegreeSelection},
    statistics,
    value::Value,
};

/// A fitted multivariate polynomial surrogate.
///
/// # Example
/// ```rust
/// use polysurrogate::{CrossValidation, Observations, SurrogateModel};
///
/// // z = 1 + x1 * x2, sampled on a grid
/// let mut rows = Vec::new();
/// for i in 0..6 {
///     for j in 0..6 {
///         let (x1, x2) = (f64::from(i) / 5.0, f64::from(j) / 5.0);
///         rows.push(vec![x1, x2, 1.0 + x1 * x2]);
///     }
/// }
/// let data = Observations::from_rows(rows).unwrap();
///
/// let cv = CrossValidation::default().with_folds(6).with_degrees(1..=4).with_seed(1);
/// let model = SurrogateModel::construct(&data, &cv).unwrap();
/// let z = model.y(&[0.5, 0.5]).unwrap();
/// assert!((z - 1.25).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateModel<T: Value = f64> {
    fit: LeastSquaresFit<T>,
    selection: Option<DegreeSelection<T>>,
}
impl<T: Value> SurrogateModel<T> {
    /// Selects a degree by cross-validation, then fits it to every observation.
    ///
    /// # Errors
    /// Any error of [`CrossValidation::select_degree`], or of the final fit in the `Fitting` stage.
    pub fn construct(observations: &Observations<T>, cv: &CrossValidation) -> Result<Self> {
        let selection = cv.select_degree(observations)?;
        let fit = least_squares(observations, selection.degree)
            .map_err(|e| e.in_stage(Stage::Fitting))?;

        log::info!(
            "constructed degree {} surrogate over {} parameters from {} observations",
            fit.degree(),
            observations.parameters(),
            observations.len()
        );
        Ok(Self {
            fit,
            selection: Some(selection),
        })
    }

    /// Fits a surrogate of a fixed degree to every observation.
    ///
    /// # Errors
    /// Returns [`Error::SingularDesignMatrix`] in the `Fitting` stage if the system cannot be solved.
    pub fn fit(observations: &Observations<T>, degree: usize) -> Result<Self> {
        let fit = least_squares(observations, degree).map_err(|e| e.in_stage(Stage::Fitting))?;
        Ok(Self {
            fit,
            selection: None,
        })
    }

    /// Rebuilds a surrogate from stored coefficients.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] in the `Validation` stage if `parameters` is 0 or
    /// `coefficients` does not have one value per monomial.
    pub fn from_coefficients(
        parameters: usize,
        degree: usize,
        coefficients: Vec<T>,
    ) -> Result<Self> {
        let fit = MonomialBasis::new(parameters, degree)
            .and_then(|basis| LeastSquaresFit::from_parts(basis, coefficients))
            .map_err(|e| e.in_stage(Stage::Validation))?;
        Ok(Self {
            fit,
            selection: None,
        })
    }

    /// Total degree of the surrogate.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.fit.degree()
    }

    /// Number of input parameters.
    #[must_use]
    pub fn parameters(&self) -> usize {
        self.fit.basis().parameters()
    }

    /// Coefficients `β`, aligned with [`SurrogateModel::basis`].
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        self.fit.coefficients()
    }

    /// Basis the coefficients are aligned with.
    #[must_use]
    pub fn basis(&self) -> &MonomialBasis {
        self.fit.basis()
    }

    /// Cross-validation report, if the degree was selected automatically.
    #[must_use]
    pub fn selection(&self) -> Option<&DegreeSelection<T>> {
        self.selection.as_ref()
    }

    /// Consumes the model, returning `(β, degree)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, usize) {
        self.fit.into_parts()
    }

    /// Evaluates the surrogate at one input vector.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] in the `Evaluation` stage if `x` does not have one
    /// value per parameter.
    pub fn y(&self, x: &[T]) -> Result<T> {
        self.fit.y(x).map_err(|e| e.in_stage(Stage::Evaluation))
    }

    /// Evaluates the surrogate at every row of an `N × P` matrix.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] in the `Evaluation` stage if the matrix does not have
    /// one column per parameter.
    pub fn predict(&self, inputs: &DMatrix<T>) -> Result<DVector<T>> {
        let basis = self.basis();
        if inputs.ncols() != basis.parameters() {
            return Err(Error::InvalidDimension(format!(
                "expected {} input columns, got {}",
                basis.parameters(),
                inputs.ncols()
            ))
            .in_stage(Stage::Evaluation));
        }

        let mut x = vec![T::zero(); inputs.ncols()];
        let y = inputs.row_iter().map(|row| {
            for (dst, src) in x.iter_mut().zip(row.iter()) {
                *dst = *src;
            }
            basis.solve(&x, self.coefficients())
        });
        Ok(DVector::from_iterator(inputs.nrows(), y))
    }

    /// Returns `z - f(x)` for every observation.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn residuals(&self, observations: &Observations<T>) -> Result<Vec<T>> {
        self.basis().check_input(observations.input(0))?;
        Ok(observations
            .iter()
            .map(|(x, z)| z - self.basis().solve(x, self.coefficients()))
            .collect())
    }

    /// Sum of squared residuals over `observations`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn sum_squared_error(&self, observations: &Observations<T>) -> Result<T> {
        self.fit.sum_squared_error(observations)
    }

    /// Mean squared residual over `observations`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn mean_squared_error(&self, observations: &Observations<T>) -> Result<T> {
        let y_fit = self.fitted(observations)?;
        Ok(statistics::mean_squared_error(
            observations.responses().iter().copied(),
            y_fit.into_iter(),
        ))
    }

    /// Root of the mean squared residual, in the units of the response.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn root_mean_squared_error(&self, observations: &Observations<T>) -> Result<T> {
        let y_fit = self.fitted(observations)?;
        Ok(statistics::root_mean_squared_error(
            observations.responses().iter().copied(),
            y_fit.into_iter(),
        ))
    }

    /// Coefficient of determination over `observations`.
    ///
    /// See [`statistics::r_squared`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn r_squared(&self, observations: &Observations<T>) -> Result<T> {
        let y_fit = self.fitted(observations)?;
        Ok(statistics::r_squared(
            observations.responses().iter().copied(),
            y_fit.into_iter(),
        ))
    }

    /// Surrogate predictions at every observed input.
    fn fitted(&self, observations: &Observations<T>) -> Result<Vec<T>> {
        self.basis().check_input(observations.input(0))?;
        Ok(observations
            .iter()
            .map(|(x, _)| self.basis().solve(x, self.coefficients()))
            .collect())
    }

    /// Summary of the model and its fit to `observations`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn properties(&self, observations: &Observations<T>) -> Result<ModelProperties<T>> {
        Ok(ModelProperties {
            degree: self.degree(),
            parameters: self.parameters(),
            data_points: observations.len(),
            coefficients: self.coefficients().to_vec(),
            sse: self.sum_squared_error(observations)?,
            mse: self.mean_squared_error(observations)?,
            rmse: self.root_mean_squared_error(observations)?,
            r_squared: self.r_squared(observations)?,
            selection: self.selection.clone(),
        })
    }

    /// Human-readable equation of the surrogate, highest-order terms first.
    ///
    /// ```rust
    /// # use polysurrogate::SurrogateModel;
    /// let model = SurrogateModel::from_coefficients(1, 2, vec![1.0, 0.0, 2.0]).unwrap();
    /// assert_eq!(model.equation(), "y = 2.00x² + 1.00");
    /// ```
    #[expect(clippy::missing_panics_doc, reason = "Infallible operation")]
    #[must_use]
    pub fn equation(&self) -> String {
        let mut output = String::new();
        self.basis()
            .format_polynomial(&mut output, self.coefficients())
            .expect("String should be infallible");
        output
    }
}

impl<T: Value> std::fmt::Display for SurrogateModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.equation())
    }
}

/// A set of diagnostic properties for a surrogate model.
///
/// Can be serialized to JSON or other formats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelProperties<T: Value> {
    /// Total degree of the surrogate.
    pub degree: usize,

    /// Number of input parameters.
    pub parameters: usize,

    /// Number of observations the diagnostics were computed on.
    pub data_points: usize,

    /// Coefficients of the surrogate.
    pub coefficients: Vec<T>,

    /// Sum of squared residuals.
    pub sse: T,

    /// Mean squared residual.
    pub mse: T,

    /// Root mean squared residual.
    pub rmse: T,

    /// Coefficient of determination.
    pub r_squared: T,

    /// Cross-validation report, if the degree was selected automatically.
    pub selection: Option<DegreeSelection<T>>,
}

/// Selects a degree with `epochs` rounds of `k_folds`-fold cross-validation, fits it to every
/// observation and returns `(β, degree)`.
///
/// Other settings are the [`CrossValidation`] defaults: degrees `1..=9`, fresh randomness per
/// call, singular degrees skipped, plain SSE sums.
///
/// # Errors
/// See [`SurrogateModel::construct`].
pub fn construct_model<T: Value>(
    observations: &Observations<T>,
    epochs: usize,
    k_folds: usize,
) -> Result<(Vec<T>, usize)> {
    let cv = CrossValidation::default()
        .with_epochs(epochs)
        .with_folds(k_folds);
    Ok(SurrogateModel::construct(observations, &cv)?.into_parts())
}

/// Evaluates the surrogate `(β, degree)` at `x`.
///
/// A degree-0 surrogate is the constant `β[0]`.
///
/// # Errors
/// Returns [`Error::InvalidDimension`] in the `Evaluation` stage if `x` is empty, or if `β`
/// does not have one value per monomial of `degree` over `x.len()` parameters.
///
/// ```rust
/// # use polysurrogate::evaluate;
/// // 1 + 2x1 + 3x2
/// assert_eq!(evaluate(&[1.0, 2.0, 3.0], 1, &[1.0, 1.0]).unwrap(), 6.0);
/// assert_eq!(evaluate(&[4.0], 0, &[9.0, 9.0]).unwrap(), 4.0);
/// ```
pub fn evaluate<T: Value>(coefficients: &[T], degree: usize, x: &[T]) -> Result<T> {
    let basis = MonomialBasis::new(x.len(), degree).map_err(|e| e.in_stage(Stage::Evaluation))?;
    if coefficients.len() != basis.k() {
        return Err(Error::InvalidDimension(format!(
            "degree {degree} over {} parameters needs {} coefficients, got {}",
            x.len(),
            basis.k(),
            coefficients.len()
        ))
        .in_stage(Stage::Evaluation));
    }

    if degree == 0 {
        return Ok(coefficients[0]);
    }

    Ok(basis.solve(x, coefficients))
}
