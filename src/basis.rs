//! Multivariate monomial basis
//!
//! A surrogate of degree `D` over `P` input parameters is a linear combination of every
//! monomial of total degree `≤ D`. [`MonomialBasis`] enumerates those monomials in a fixed
//! order and turns an input vector into the matching row of the design matrix.
//!
//! # Enumeration
//! Each monomial is a multiset of exactly `D` factors drawn with repetition from the
//! `P + 1` element set `{1, x₁, …, x_P}`. Picking the constant `1` several times is how
//! lower-degree terms appear. The multisets are listed as combinations-with-replacement
//! of the indices `0..=P` in lexicographic order, index `0` being the constant:
//!
//! ```text
//! P = 2, D = 2:   1·1   1·x₁   1·x₂   x₁·x₁   x₁·x₂   x₂·x₂
//!                 1     x₁     x₂     x₁²     x₁x₂    x₂²
//! ```
//!
//! The number of columns is `C(D + P, P)`.
//!
//! Coefficients are positionally aligned to this order, so the same basis must be used to
//! fit and to evaluate a model.
use nalgebra::MatrixViewMut;

use crate::{
    display::{self, Sign, DEFAULT_PRECISION},
    error::{Error, Result},
    statistics,
    value::Value,
};

/// Largest number of monomials [`MonomialBasis::new`] will enumerate.
///
/// The normal equations of a basis this size already need `MAX_TERMS²` values.
pub const MAX_TERMS: usize = 1 << 20;

/// Full multivariate monomial basis of a fixed degree.
///
/// # Example
/// ```rust
/// use polysurrogate::basis::MonomialBasis;
///
/// let basis = MonomialBasis::new(2, 2).unwrap();
/// assert_eq!(basis.k(), 6);
///
/// let row = basis.expand(&[2.0, 3.0]).unwrap();
/// assert_eq!(row, vec![1.0, 2.0, 3.0, 4.0, 6.0, 9.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonomialBasis {
    parameters: usize,
    degree: usize,

    /// Factor indices per column; 0 is the constant, `i` is `x_i`
    terms: Vec<Vec<usize>>,
}
impl MonomialBasis {
    /// Creates the basis for `parameters` inputs and total degree `degree`.
    ///
    /// # Errors
    /// - [`Error::InvalidDimension`] if `parameters` is 0.
    /// - [`Error::InvalidDegree`] if the basis would hold more than [`MAX_TERMS`] monomials.
    pub fn new(parameters: usize, degree: usize) -> Result<Self> {
        if parameters == 0 {
            return Err(Error::InvalidDimension(
                "a surrogate needs at least one input parameter".to_string(),
            ));
        }

        let count = Self::count(parameters, degree);
        if count > MAX_TERMS {
            return Err(Error::InvalidDegree(format!(
                "degree {degree} over {parameters} parameters has {count} monomials, more than {MAX_TERMS}"
            )));
        }

        let mut terms = Vec::with_capacity(count);
        let mut indices = vec![0usize; degree];
        loop {
            terms.push(indices.clone());

            // Advance the rightmost index that can still grow, resetting everything after it
            let Some(i) = indices.iter().rposition(|&j| j != parameters) else {
                break;
            };
            let next = indices[i] + 1;
            for j in &mut indices[i..] {
                *j = next;
            }
        }

        Ok(Self {
            parameters,
            degree,
            terms,
        })
    }

    /// Returns the number of monomials for `parameters` inputs at `degree`.
    ///
    /// This is `C(degree + parameters, parameters)`, the "stars and bars" count.
    #[must_use]
    pub fn count(parameters: usize, degree: usize) -> usize {
        statistics::binomial(degree.saturating_add(parameters), parameters)
    }

    /// Number of input parameters.
    #[must_use]
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Total degree of the basis.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of basis functions (columns of the design matrix).
    #[must_use]
    pub fn k(&self) -> usize {
        self.terms.len()
    }

    /// Returns the power of each input parameter in the `j`th monomial.
    ///
    /// Returns None if the monomial does not exist.
    ///
    /// ```rust
    /// # use polysurrogate::basis::MonomialBasis;
    /// let basis = MonomialBasis::new(2, 2).unwrap();
    /// assert_eq!(basis.exponents(4), Some(vec![1, 1])); // x₁x₂
    /// ```
    #[must_use]
    pub fn exponents(&self, j: usize) -> Option<Vec<u32>> {
        let term = self.terms.get(j)?;
        let mut powers = vec![0u32; self.parameters];
        for &factor in term.iter().filter(|&&f| f != 0) {
            powers[factor - 1] += 1;
        }
        Some(powers)
    }

    /// Checks that `x` has one value per input parameter.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] on a length mismatch.
    pub fn check_input<T>(&self, x: &[T]) -> Result<()> {
        if x.len() == self.parameters {
            Ok(())
        } else {
            Err(Error::InvalidDimension(format!(
                "expected {} input parameters, got {}",
                self.parameters,
                x.len()
            )))
        }
    }

    /// Evaluates the `j`th monomial at `x`.
    ///
    /// `x` must have [`MonomialBasis::parameters`] values.
    #[inline]
    pub fn solve_function<T: Value>(&self, j: usize, x: &[T]) -> T {
        self.terms[j]
            .iter()
            .filter(|&&f| f != 0)
            .fold(T::one(), |acc, &f| acc * x[f - 1])
    }

    /// Populates a row of the design matrix with every monomial evaluated at `x`.
    ///
    /// `x` must have [`MonomialBasis::parameters`] values and `row` must have [`MonomialBasis::k`] columns.
    pub fn fill_matrix_row<
        T: Value,
        R: nalgebra::Dim,
        C: nalgebra::Dim,
        RS: nalgebra::Dim,
        CS: nalgebra::Dim,
    >(
        &self,
        x: &[T],
        mut row: MatrixViewMut<T, R, C, RS, CS>,
    ) {
        for j in 0..self.k() {
            row[j] = self.solve_function(j, x);
        }
    }

    /// Expands `x` into the full sequence of monomial values, in basis order.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if `x` has the wrong length.
    pub fn expand<T: Value>(&self, x: &[T]) -> Result<Vec<T>> {
        self.check_input(x)?;
        Ok((0..self.k()).map(|j| self.solve_function(j, x)).collect())
    }

    /// Evaluates `Σ cⱼ · φⱼ(x)` for the given coefficients.
    ///
    /// `x` must have [`MonomialBasis::parameters`] values. Extra coefficients are ignored,
    /// missing ones count as zero.
    pub fn solve<T: Value>(&self, x: &[T], coefficients: &[T]) -> T {
        coefficients
            .iter()
            .enumerate()
            .take(self.k())
            .fold(T::zero(), |acc, (j, &c)| acc + c * self.solve_function(j, x))
    }
}

impl<T: Value> display::PolynomialDisplay<T> for MonomialBasis {
    fn format_term(&self, j: usize, coef: T) -> Option<display::Term> {
        let sign = Sign::from_coef(coef);
        let powers = self.exponents(j)?;
        let total: u32 = powers.iter().sum();

        let base: String = powers
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let label = (self.parameters > 1).then(|| (i + 1).to_string());
                display::format_variable("x", label.as_deref(), p)
            })
            .collect();

        let coef = display::format_coefficient(coef, total, DEFAULT_PRECISION)?;
        Some(display::Term::new(sign, format!("{coef}{base}")))
    }
}
