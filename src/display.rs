//! Utilities for displaying fitted surrogates
//!
//! This module converts coefficient vectors into human-readable
//! equations, handles coefficient formatting, and adds superscript exponents
//! and subscript parameter labels.
//!
//! # Key Concepts
//! - **[`PolynomialDisplay`]**: Trait to define how a basis renders terms.
//! - **[`Term`]**: Represents a single polynomial term with a sign and body.
//! - **[`Sign`]**: Tracks whether a term is positive or negative.
//!
//! # Helpers
//! - [`format_coefficient`]: Formats a numeric coefficient, skipping zeros.
//! - [`format_variable`]: Renders `x₁²`-style variables.
use crate::value::Value;

pub mod unicode;

/// Default precision for formatting used by [`PolynomialDisplay`]
pub const DEFAULT_PRECISION: usize = 2;

/// Default range in which scientific notation is not used
#[must_use]
pub fn default_fixed_range<T: Value>() -> Option<std::ops::Range<T>> {
    const RANGE: std::ops::Range<f64> = 1e-3..1e3;
    let s = T::try_cast(RANGE.start).ok()?;
    let e = T::try_cast(RANGE.end).ok()?;
    Some(s..e)
}

/// Trait for formatting and displaying polynomial expressions.
///
/// Implementors control how individual terms are displayed,
/// while a default implementation assembles them into a full equation.
pub trait PolynomialDisplay<T: Value> {
    /// Formats the `j`th term of the polynomial for display.
    ///
    /// Returning `None` indicates the term should be skipped
    /// (typically when the coefficient is zero).
    fn format_term(&self, j: usize, coef: T) -> Option<Term>;

    /// Writes the full polynomial expression into the provided buffer.
    ///
    /// The output is prefixed with `"y = "`, highest terms first. The first
    /// nonzero term is written without a leading `+`.
    ///
    /// # Errors
    /// Returns an error if writing to `buffer` fails.
    fn format_polynomial<B: std::fmt::Write>(
        &self,
        buffer: &mut B,
        coefficients: &[T],
    ) -> std::fmt::Result {
        let mut terms: Vec<Term> = coefficients
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(j, &coef)| self.format_term(j, coef))
            .collect();

        write!(buffer, "y = ")?;
        if terms.is_empty() {
            write!(buffer, "0")?;
            return Ok(());
        }

        // Extract the first term to avoid leading '+'
        let term_n = terms.remove(0);
        if term_n.sign == Sign::Negative {
            write!(buffer, "{}", term_n.sign.char())?;
        }
        write!(buffer, "{}", term_n.body)?;

        for term in terms {
            let sign = term.sign.char();
            let body = term.body;

            write!(buffer, " {sign} {body}")?;
        }

        Ok(())
    }
}

/// Represents the sign of a polynomial term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Positive sign (`+` when displayed).
    Positive,

    /// Negative sign (`-` when displayed).
    Negative,
}

impl Sign {
    /// Determines the sign from a numeric coefficient.
    ///
    /// # Example
    /// ```
    /// # use polysurrogate::display::Sign;
    /// assert_eq!(Sign::from_coef(3.0), Sign::Positive);
    /// assert_eq!(Sign::from_coef(-2.0), Sign::Negative);
    /// ```
    pub fn from_coef<T: Value>(coef: T) -> Self {
        if Value::is_sign_negative(&coef) {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    /// Returns the character representation of the sign.
    #[must_use]
    pub fn char(&self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

/// A single term of a polynomial for display purposes.
///
/// Combines the **sign** and the **formatted body** of a term (e.g., `"2x₁²"`, `"3.14"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The sign of the term.
    pub sign: Sign,

    /// The body of the term, without its sign.
    pub body: String,
}

impl Term {
    /// Creates a new polynomial term with the given sign and body.
    #[must_use]
    pub fn new(sign: Sign, body: String) -> Self {
        Self { sign, body }
    }
}

/// Formats a numeric coefficient for display in a polynomial term.
///
/// - Returns `None` if the coefficient is zero or effectively zero (≤ epsilon).
/// - Returns an empty string for a unit coefficient on a non-constant term.
/// - Formats as a decimal if the absolute value is between `1e-3` and `1e3`.
/// - Formats in scientific notation otherwise.
///
/// # Example
/// ```
/// # use polysurrogate::display::format_coefficient;
/// assert_eq!(format_coefficient(0.0, 1, 2), None);
/// assert_eq!(format_coefficient(2.5, 1, 2), Some("2.50".to_string()));
/// assert_eq!(format_coefficient(1e5, 1, 2), Some("1.00e5".to_string()));
/// ```
pub fn format_coefficient<T: Value>(coef: T, degree: u32, precision: usize) -> Option<String> {
    let abs = Value::abs(coef);

    if coef.is_zero() || abs <= T::epsilon() {
        return None;
    }

    if Value::abs_sub(coef, T::one()) <= T::epsilon() && degree != 0 {
        return Some(String::new());
    }

    let sci_cutoff = default_fixed_range();
    Some(unicode::float(abs, sci_cutoff, precision))
}

/// Formats one variable of a polynomial term.
///
/// - If `exp == 0`, returns an empty string.
/// - Otherwise returns `base`, followed by the subscript label if any, and a
///   superscript exponent when `exp > 1`.
///
/// # Examples
/// ```
/// # use polysurrogate::display::format_variable;
/// assert_eq!(format_variable("x", None, 0), "");
/// assert_eq!(format_variable("x", None, 1), "x");
/// assert_eq!(format_variable("x", Some("1"), 1), "x₁");
/// assert_eq!(format_variable("x", Some("2"), 3), "x₂³");
/// ```
#[must_use]
pub fn format_variable(base: &str, subscript: Option<&str>, exp: u32) -> String {
    if exp == 0 {
        return String::new();
    }

    let lbl = unicode::subscript(subscript.unwrap_or_default());
    let sup = if exp == 1 {
        String::new()
    } else {
        unicode::superscript(&exp.to_string())
    };
    format!("{base}{lbl}{sup}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyBasis;

    impl PolynomialDisplay<f64> for DummyBasis {
        fn format_term(&self, j: usize, coef: f64) -> Option<Term> {
            let sign = Sign::from_coef(coef);
            let degree = u32::try_from(j).ok()?;
            let coef_str = format_coefficient(coef, degree, DEFAULT_PRECISION)?;
            Some(Term::new(
                sign,
                format!("{coef_str}{}", format_variable("x", None, degree)),
            ))
        }
    }

    #[test]
    fn test_sign_from_coef() {
        assert_eq!(Sign::from_coef(1.0), Sign::Positive);
        assert_eq!(Sign::from_coef(-1.0), Sign::Negative);
        assert_eq!(Sign::from_coef(0.0), Sign::Positive);
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(-2.5, 1, 2), Some("2.50".to_string()));
        assert_eq!(format_coefficient(1e-20, 1, 2), None);
        assert_eq!(format_coefficient(1e-5, 2, 2), Some("1.00e-5".to_string()));
        assert_eq!(format_coefficient(1.0, 2, 2), Some(String::new()));
        assert_eq!(format_coefficient(1.0, 0, 2), Some("1.00".to_string()));
    }

    #[test]
    fn test_format_polynomial_basic() {
        let mut buf = String::new();
        DummyBasis
            .format_polynomial(&mut buf, &[2.0, -3.0, 0.0, 4.0])
            .unwrap();
        assert_eq!(buf, "y = 4.00x³ - 3.00x + 2.00");
    }

    #[test]
    fn test_format_polynomial_all_zero() {
        let mut buf = String::new();
        DummyBasis.format_polynomial(&mut buf, &[0.0, 0.0]).unwrap();
        assert_eq!(buf, "y = 0");
    }

    #[test]
    fn test_format_polynomial_leading_negative() {
        let mut buf = String::new();
        DummyBasis.format_polynomial(&mut buf, &[1.0, -2.0]).unwrap();
        assert_eq!(buf, "y = -2.00x + 1.00");
    }
}
