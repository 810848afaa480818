//! Ordinary least-squares fitting of monomial surrogates
//!
//! [`least_squares`] builds the design matrix `X` (one row per observation, one column per
//! monomial), forms the normal equations and solves them:
//!
//! ```math
//! β = (XᵀX)⁻¹ Xᵀz
//! ```
//!
//! No centering, scaling or regularization is applied.
use nalgebra::{DMatrix, DVector};
use num_traits::float::FloatCore;

use crate::{
    basis::MonomialBasis,
    error::{Error, Result},
    observations::Observations,
    statistics,
    value::Value,
};

/// Coefficients of a fixed-degree surrogate, fitted by least squares.
///
/// Coefficients are aligned with the column order of [`LeastSquaresFit::basis`].
///
/// # Example
/// ```rust
/// use polysurrogate::{fit::least_squares, Observations};
///
/// // z = 1 + 2x
/// let data: Observations = Observations::from_pairs(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
/// let fit = least_squares(&data, 1).unwrap();
///
/// let beta = fit.coefficients();
/// assert!((beta[0] - 1.0).abs() < 1e-9);
/// assert!((beta[1] - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresFit<T: Value = f64> {
    basis: MonomialBasis,
    coefficients: Vec<T>,
}

/// Fits a surrogate of total degree `degree` to every row of `observations`.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// The normal-equations matrix `XᵀX` is solved by LU decomposition with partial pivoting.
/// It is treated as singular when there are fewer observations than monomials, when a pivot is
/// exactly zero, or when the solution is not finite.
///
/// Ill-conditioned but full-rank systems, such as raw inputs far from the origin at a high
/// degree, are still solved.
/// </div>
///
/// # Errors
/// - [`Error::SingularDesignMatrix`] if `XᵀX` cannot be inverted.
/// - [`Error::InvalidDegree`] if the basis is too large to enumerate, see [`crate::basis::MAX_TERMS`].
pub fn least_squares<T: Value>(
    observations: &Observations<T>,
    degree: usize,
) -> Result<LeastSquaresFit<T>> {
    let n = observations.len();
    let k = MonomialBasis::count(observations.parameters(), degree);
    if n < k {
        return Err(Error::SingularDesignMatrix { n, k });
    }

    let basis = MonomialBasis::new(observations.parameters(), degree)?;

    let rows: Vec<(&[T], T)> = observations.iter().collect();
    let (xtx, xtb) = LeastSquaresFit::create_normal_equations(&rows, &basis);
    let coefficients = LeastSquaresFit::solve_matrix(xtx, &xtb, n)?;

    log::trace!("fitted degree {degree} to {n} observations ({k} monomials)");
    Ok(LeastSquaresFit {
        basis,
        coefficients,
    })
}

/// Builds the `N × M` design matrix of `observations` for a surrogate of total degree `degree`.
///
/// Row `i` holds every monomial of the degree `degree` [`MonomialBasis`] evaluated at input `i`,
/// in basis order.
///
/// # Errors
/// Returns [`Error::InvalidDegree`] if the basis is too large to enumerate.
///
/// ```rust
/// # use polysurrogate::{fit::design_matrix, Observations};
/// let data = Observations::from_rows(vec![vec![2.0, 3.0, 0.0], vec![1.0, 0.0, 0.0]]).unwrap();
/// let x = design_matrix(&data, 2).unwrap();
/// assert_eq!(x.shape(), (2, 6));
/// assert_eq!(x.row(0).iter().copied().collect::<Vec<_>>(), [1.0, 2.0, 3.0, 4.0, 6.0, 9.0]);
/// ```
pub fn design_matrix<T: Value>(
    observations: &Observations<T>,
    degree: usize,
) -> Result<DMatrix<T>> {
    let basis = MonomialBasis::new(observations.parameters(), degree)?;
    let rows: Vec<(&[T], T)> = observations.iter().collect();
    let (x, _) = LeastSquaresFit::create_matrix(&rows, &basis);
    Ok(x)
}

impl<T: Value> LeastSquaresFit<T> {
    /// Assembles a fit from a basis and coefficients produced elsewhere.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if there is not exactly one coefficient per monomial.
    pub fn from_parts(basis: MonomialBasis, coefficients: Vec<T>) -> Result<Self> {
        if coefficients.len() != basis.k() {
            return Err(Error::InvalidDimension(format!(
                "degree {} over {} parameters needs {} coefficients, got {}",
                basis.degree(),
                basis.parameters(),
                basis.k(),
                coefficients.len()
            )));
        }

        Ok(Self {
            basis,
            coefficients,
        })
    }

    /// Basis the coefficients are aligned with.
    #[must_use]
    pub fn basis(&self) -> &MonomialBasis {
        &self.basis
    }

    /// Total degree of the surrogate.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    /// Coefficient vector `β`, one value per monomial.
    #[must_use]
    pub fn coefficients(&self) -> &[T] {
        &self.coefficients
    }

    /// Consumes the fit, returning `(β, degree)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, usize) {
        let degree = self.basis.degree();
        (self.coefficients, degree)
    }

    /// Evaluates the surrogate at `x`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if `x` has the wrong number of parameters.
    pub fn y(&self, x: &[T]) -> Result<T> {
        self.basis.check_input(x)?;
        Ok(self.basis.solve(x, &self.coefficients))
    }

    /// Squared L2 norm of the residuals of this fit over `observations`.
    ///
    /// Used to score a fit on held-out data.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if the observations have a different parameter count.
    pub fn sum_squared_error(&self, observations: &Observations<T>) -> Result<T> {
        self.basis.check_input(observations.input(0))?;
        let y_fit = observations
            .iter()
            .map(|(x, _)| self.basis.solve(x, &self.coefficients));
        Ok(statistics::sum_squared_error(
            observations.responses().iter().copied(),
            y_fit,
        ))
    }

    /// Turns a set of rows into a design matrix and response vector.
    fn create_matrix(rows: &[(&[T], T)], basis: &MonomialBasis) -> (DMatrix<T>, DVector<T>) {
        let mut bigx = DMatrix::zeros(rows.len(), basis.k());
        let b = DVector::from_iterator(rows.len(), rows.iter().map(|&(_, z)| z));

        for (row, (x, _)) in bigx.row_iter_mut().zip(rows.iter()) {
            basis.fill_matrix_row(x, row);
        }

        (bigx, b)
    }

    /// Builds the `(XᵀX, Xᵀz)` pair for `rows`.
    ///
    /// With the `parallel` feature, large inputs are split into chunks whose partial normal
    /// equations are built on separate threads and then summed.
    fn create_normal_equations(
        rows: &[(&[T], T)],
        basis: &MonomialBasis,
    ) -> (DMatrix<T>, DVector<T>) {
        #[cfg(not(feature = "parallel"))]
        {
            let (m, b) = Self::create_matrix(rows, basis);
            return Self::invert_matrix(&m, &b);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            const MIN_ROWS_TO_PARALLEL: usize = 500_000;

            if rows.len() < MIN_ROWS_TO_PARALLEL {
                let (m, b) = Self::create_matrix(rows, basis);
                return Self::invert_matrix(&m, &b);
            }

            let k = basis.k();
            let chunk_size = (rows.len() / rayon::current_num_threads()).max(1);
            let partials: Vec<(DMatrix<T>, DVector<T>)> = rows
                .par_chunks(chunk_size)
                .map(|chunk| {
                    let (m, b) = Self::create_matrix(chunk, basis);
                    Self::invert_matrix(&m, &b)
                })
                .collect();

            // Compensated summation keeps the chunked result close to the single-pass one
            let mut xtx = DMatrix::<T>::zeros(k, k);
            let mut xtb = DVector::<T>::zeros(k);
            let mut xtx_c = DMatrix::<T>::zeros(k, k);
            let mut xtb_c = DVector::<T>::zeros(k);
            for (part_xtx, part_xtb) in partials {
                for i in 0..k {
                    kahan_add(&mut xtb[i], &mut xtb_c[i], part_xtb[i]);
                    for j in 0..k {
                        kahan_add(&mut xtx[(i, j)], &mut xtx_c[(i, j)], part_xtx[(i, j)]);
                    }
                }
            }

            (xtx, xtb)
        }
    }

    /// Reduce the n by k / n by 1 pair into a k by k and k by 1 system.
    fn invert_matrix(matrix: &DMatrix<T>, b: &DVector<T>) -> (DMatrix<T>, DVector<T>) {
        (matrix.tr_mul(matrix), matrix.tr_mul(b))
    }

    /// Solves the normal equations using LU decomposition.
    fn solve_matrix(xtx: DMatrix<T>, xtb: &DVector<T>, n: usize) -> Result<Vec<T>> {
        let k = xtx.nrows();
        let singular = || Error::SingularDesignMatrix { n, k };

        if xtx.iter().any(|v| !FloatCore::is_finite(*v)) {
            return Err(singular());
        }

        // None only for an exactly zero pivot
        let big_x = xtx.lu().solve(xtb).ok_or_else(singular)?;
        let coefficients: Vec<_> = big_x.data.into();

        if coefficients.iter().any(|c| !FloatCore::is_finite(*c)) {
            return Err(singular());
        }

        Ok(coefficients)
    }
}

#[cfg(feature = "parallel")]
fn kahan_add<T: Value>(sum: &mut T, compensation: &mut T, value: T) {
    let y = value - *compensation;
    let t = *sum + y;
    *compensation = (t - *sum) - y;
    *sum = t;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assert_all_close, assert_close, test::synthetic_observations, value::SteppedValues,
    };

    #[test]
    fn test_recovers_linear_coefficients() {
        // z = 3 - 2x
        let data: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let x = f64::from(i) / 10.0;
                (x, 3.0 - 2.0 * x)
            })
            .collect();
        let data = Observations::from_pairs(&data).unwrap();

        let fit = least_squares(&data, 1).unwrap();
        assert_all_close!(fit.coefficients(), [3.0, -2.0], tol = 1e-6);
    }

    #[test]
    fn test_recovers_multivariate_plane() {
        // z = 0.5 + x1 - 4x2 + 2x3
        let data = synthetic_observations(3, 40, -1.0..=1.0, 0.0, Some(7), |x| {
            0.5 + x[0] - 4.0 * x[1] + 2.0 * x[2]
        });

        let fit = least_squares(&data, 1).unwrap();
        assert_all_close!(fit.coefficients(), [0.5, 1.0, -4.0, 2.0], tol = 1e-6);
        assert_close!(fit.y(&[1.0, 1.0, 1.0]).unwrap(), -0.5, tol = 1e-6);
    }

    #[test]
    fn test_exactly_determined_system_has_zero_residual() {
        // Degree 2 over 2 parameters needs 6 coefficients; give it exactly 6 points
        let points: [[f64; 2]; 6] = [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 2.0]];
        let inputs = points.iter().map(|p| p.to_vec()).collect();
        let responses = points.iter().map(|p| p[0].sin() + p[1].cos()).collect();
        let data = Observations::new(inputs, responses).unwrap();
        let fit = least_squares(&data, 2).unwrap();

        let sse = fit.sum_squared_error(&data).unwrap();
        assert_close!(sse, 0.0, tol = 1e-12);
    }

    #[test]
    fn test_too_few_observations_is_singular() {
        let data = Observations::from_pairs(&[(0.0, 1.0), (1.0, 2.0)]).unwrap();
        let err = least_squares(&data, 2).unwrap_err();
        assert!(matches!(err, Error::SingularDesignMatrix { n: 2, k: 3 }));
    }

    #[test]
    fn test_degenerate_input_is_singular() {
        // x2 never varies from 0, so its column carries no information
        let inputs = (0..10).map(|i| vec![f64::from(i), 0.0]).collect();
        let responses = (0..10).map(f64::from).collect();
        let data = Observations::new(inputs, responses).unwrap();

        let err = least_squares(&data, 1).unwrap_err();
        assert!(matches!(err, Error::SingularDesignMatrix { n: 10, k: 3 }));
    }

    #[test]
    fn test_fits_inputs_far_from_origin() {
        // Longitude/latitude-like inputs with a cubic response
        let f = |x: f64, y: f64| 1.0 + 0.1 * x + 0.2 * y + 0.01 * x * y + 0.001 * x * x * x;
        let mut inputs = Vec::new();
        let mut responses = Vec::new();
        for x in SteppedValues::new(-100.0..=-90.0, 0.5) {
            for y in SteppedValues::new(30.0..=40.0, 0.5) {
                inputs.push(vec![x, y]);
                responses.push(f(x, y));
            }
        }
        let data = Observations::new(inputs, responses).unwrap();

        let quadratic = least_squares(&data, 2).unwrap();
        let cubic = least_squares(&data, 3).unwrap();
        let sse2 = quadratic.sum_squared_error(&data).unwrap();
        let sse3 = cubic.sum_squared_error(&data).unwrap();

        assert!(sse3.is_finite());
        assert!(sse3 < sse2, "cubic SSE {sse3} should beat quadratic SSE {sse2}");
        assert_close!(cubic.y(&[-95.0, 35.0]).unwrap(), f(-95.0, 35.0), tol = 0.05);
    }

    #[test]
    fn test_wide_input_is_rejected_before_enumeration() {
        // 30 parameters at degree 9 is C(39, 30) monomials
        let data = synthetic_observations(30, 40, 0.0..=1.0, 0.0, Some(2), |x| x.iter().sum());
        let err = least_squares(&data, 9).unwrap_err();
        assert!(matches!(
            err,
            Error::SingularDesignMatrix { n: 40, k } if k == MonomialBasis::count(30, 9)
        ));
    }

    #[test]
    fn test_design_matrix_rows_are_expansions() {
        let data = synthetic_observations(3, 5, -1.0..=1.0, 0.0, Some(4), |x| x[0]);
        let x = design_matrix(&data, 2).unwrap();
        let basis = MonomialBasis::new(3, 2).unwrap();

        assert_eq!(x.shape(), (5, basis.k()));
        for (i, (input, _)) in data.iter().enumerate() {
            let row: Vec<f64> = x.row(i).iter().copied().collect();
            assert_all_close!(row, basis.expand(input).unwrap());
        }
    }

    #[test]
    fn test_from_parts_checks_length() {
        let basis = MonomialBasis::new(2, 1).unwrap();
        assert!(LeastSquaresFit::from_parts(basis.clone(), vec![1.0, 2.0]).is_err());

        let fit = LeastSquaresFit::from_parts(basis, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(fit.y(&[1.0, 1.0]).unwrap(), 6.0);
        assert!(fit.y(&[1.0]).is_err());
        assert_eq!(fit.into_parts(), (vec![1.0, 2.0, 3.0], 1));
    }
}
