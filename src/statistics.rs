//! Functions for scoring surrogate fits
//!
//! # Error Metrics
//! - [`sum_squared_error`]: Squared L2 norm of the residual vector. This is the quantity cross-validation minimizes.
//! - [`mean_squared_error`]: Average squared difference between observed and predicted values. Lower is better.
//! - [`root_mean_squared_error`]: Square root of MSE, giving error in same units as observed values. Lower is better.
//!
//! # Model Fit
//! - [`r_squared`]: Proportion of variance explained by the model. Higher is better (0 to 1).
//!
//! # Combinatorics
//! - [`binomial`]: `n choose r`, used to count monomials.
//!
//! # Examples
//!
//! ```rust
//! use polysurrogate::statistics::{r_squared, sum_squared_error};
//!
//! let y = vec![1.0, 2.0, 3.0];
//! let y_fit = vec![1.1, 1.9, 3.05];
//!
//! let sse = sum_squared_error(y.iter().copied(), y_fit.iter().copied());
//! let r2 = r_squared(y.into_iter(), y_fit.into_iter());
//! println!("SSE = {sse}, R² = {r2}");
//! ```
use crate::value::Value;

/// Computes the binomial coefficient `n choose r`.
///
/// Returns 0 when `r > n`. Intermediate products are kept exact by dividing at each step,
/// which is always integral for the running product `C(n, i+1) = C(n, i) * (n - i) / (i + 1)`.
///
/// Saturates at `usize::MAX` instead of overflowing.
///
/// # Example
/// ```rust
/// # use polysurrogate::statistics::binomial;
/// assert_eq!(binomial(5, 2), 10);
/// assert_eq!(binomial(2, 5), 0);
/// ```
#[must_use]
pub fn binomial(n: usize, r: usize) -> usize {
    if r > n {
        return 0;
    }

    let r = r.min(n - r);
    let mut value: usize = 1;
    for i in 0..r {
        value = match value.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return usize::MAX,
        };
    }
    value
}

/// Computes the sum of squared errors between observed and predicted values.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// SSE = Σ (y_i - y_fit_i)² = ‖y - y_fit‖₂²
/// ```
/// </div>
///
/// # Example
/// ```rust
/// # use polysurrogate::statistics::sum_squared_error;
/// let sse = sum_squared_error(vec![1.0, 2.0].into_iter(), vec![0.0, 0.0].into_iter());
/// assert_eq!(sse, 5.0);
/// ```
pub fn sum_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let (sse, _) = sse_with_n(y, y_fit);
    sse
}

/// Computes the mean squared error (MSE) between two sets of values.
///
/// Returns NaN if the iterators are empty.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// MSE = (1/n) * Σ (y_i - y_fit_i)²
/// ```
/// </div>
pub fn mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    let (sse, n) = sse_with_n(y, y_fit);
    sse / n
}

/// Computes the root mean squared error (RMSE) between two sets of values.
pub fn root_mean_squared_error<T: Value>(
    y: impl Iterator<Item = T>,
    y_fit: impl Iterator<Item = T>,
) -> T {
    mean_squared_error(y, y_fit).sqrt()
}

/// Calculate the R-squared value for a set of data.
///
/// R-squared is a number between 0 and 1 that tells you how well the model explains the data:
/// - `0` means the model explains none of the variation.
/// - `1` means the model explains all the variation.
///
/// <div class="warning">
///
/// **Technical Details**
///
/// ```math
/// R² = 1 - (SS_res / SS_tot)
/// where
///   SS_res = Σ (y_i - y_fit_i)²
///   SS_tot = Σ (y_i - y_mean)²
/// ```
/// </div>
///
/// If the observed values are constant, `SS_tot` is zero; a perfect fit then scores 1 and
/// anything else scores 0.
pub fn r_squared<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> T {
    let y: Vec<T> = y.collect();
    let y_fit: Vec<T> = y_fit.collect();

    //
    // Mean of the observed values
    let mut y_mean = T::zero();
    let mut y_n = T::zero();
    for y in &y {
        y_mean += *y;
        y_n += T::one();
    }
    y_mean /= y_n;

    //
    // Sum of (y - y_fit)^2
    // Sum of (y - y_mean)^2
    let mut ss_total = T::zero();
    let mut ss_residual = T::zero();
    for (y, y_fit) in y.into_iter().zip(y_fit) {
        ss_total += Value::powi(y - y_mean, 2);
        ss_residual += Value::powi(y - y_fit, 2);
    }

    if ss_total == T::zero() {
        return if ss_residual == T::zero() {
            T::one()
        } else {
            T::zero()
        };
    }

    T::one() - (ss_residual / ss_total)
}

/// Internal impl for performance
///
/// Returns (sum of squared errors, count)
fn sse_with_n<T: Value>(y: impl Iterator<Item = T>, y_fit: impl Iterator<Item = T>) -> (T, T) {
    let mut total = T::zero();
    let mut n = T::zero();
    for (y, y_fit) in y.zip(y_fit) {
        total += Value::powi(y - y_fit, 2);
        n += T::one();
    }
    (total, n)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn binomial_small_values() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(4, 0), 1);
        assert_eq!(binomial(4, 4), 1);
        assert_eq!(binomial(6, 2), 15);
        assert_eq!(binomial(11, 2), 55); // degree 9, one parameter
        assert_eq!(binomial(3, 4), 0);
    }

    #[test]
    fn binomial_saturates() {
        assert_eq!(binomial(usize::MAX, 3), usize::MAX);
    }

    #[test]
    fn sse_simple_case() {
        // errors: [1, 2], squared = [1, 4]
        let y = vec![1.0, 2.0];
        let y_fit = vec![0.0, 0.0];
        assert_eq!(sum_squared_error::<f64>(y.into_iter(), y_fit.into_iter()), 5.0);
    }

    #[test]
    fn mse_and_rmse() {
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![0.0, 0.0, 0.0];
        let mse = mean_squared_error::<f64>(y.clone().into_iter(), y_fit.clone().into_iter());
        assert!((mse - 14.0 / 3.0).abs() < 1e-12);

        let rmse = root_mean_squared_error::<f64>(y.into_iter(), y_fit.into_iter());
        assert!((rmse - (14.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mse_empty_is_nan() {
        let y: Vec<f64> = vec![];
        assert!(mean_squared_error(y.clone().into_iter(), y.into_iter()).is_nan());
    }

    #[test]
    fn r_squared_perfect_fit() {
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![1.0, 2.0, 3.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(r2, 1.0);
    }

    #[test]
    fn r_squared_bad_fit() {
        // mean(y) = 2, SST = 2, SSE = 2
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![2.0, 2.0, 2.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(r2, 0.0);
    }

    #[test]
    fn r_squared_negative_case() {
        // SST = 2, SSE = 9² + 8² + 7² = 194
        let y = vec![1.0, 2.0, 3.0];
        let y_fit = vec![10.0, 10.0, 10.0];
        let r2 = r_squared::<f64>(y.into_iter(), y_fit.into_iter());
        assert_eq!(r2, -96.0);
    }

    #[test]
    fn r_squared_constant_y() {
        let y = vec![4.0, 4.0];
        assert_eq!(r_squared::<f64>(y.clone().into_iter(), y.clone().into_iter()), 1.0);
        assert_eq!(r_squared::<f64>(y.into_iter(), vec![3.0, 5.0].into_iter()), 0.0);
    }
}
