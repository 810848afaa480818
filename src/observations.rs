//! Training data for surrogate models
//!
//! An [`Observations`] set is an ordered list of rows, each an input vector of `P`
//! parameters plus one scalar response. Every row has the same `P`, and there is at
//! least one row and one parameter.
use crate::{
    error::{Error, Result},
    value::Value,
};

/// Validated, read-only set of `(inputs, response)` rows.
///
/// Inputs are stored row-major, so [`Observations::input`] is a plain slice.
///
/// # Example
/// ```rust
/// use polysurrogate::Observations;
///
/// // z = x + 2y
/// let data = Observations::from_rows(vec![
///     vec![0.0, 0.0, 0.0],
///     vec![1.0, 0.0, 1.0],
///     vec![0.0, 1.0, 2.0],
/// ]).unwrap();
///
/// assert_eq!(data.len(), 3);
/// assert_eq!(data.parameters(), 2);
/// assert_eq!(data.input(2), &[0.0, 1.0]);
/// assert_eq!(data.response(2), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Observations<T: Value = f64> {
    parameters: usize,
    inputs: Vec<T>,
    responses: Vec<T>,
}
impl<T: Value> Observations<T> {
    /// Creates an observation set from input vectors and matching responses.
    ///
    /// # Errors
    /// - [`Error::NoData`] if there are no rows.
    /// - [`Error::InvalidDimension`] if the first row is empty, rows differ in length,
    ///   or the number of responses does not match the number of rows.
    pub fn new(inputs: Vec<Vec<T>>, responses: Vec<T>) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::NoData);
        }

        if inputs.len() != responses.len() {
            return Err(Error::InvalidDimension(format!(
                "{} input rows but {} responses",
                inputs.len(),
                responses.len()
            )));
        }

        let parameters = inputs[0].len();
        if parameters == 0 {
            return Err(Error::InvalidDimension(
                "observations need at least one input parameter".to_string(),
            ));
        }

        let mut flat = Vec::with_capacity(inputs.len() * parameters);
        for (i, row) in inputs.into_iter().enumerate() {
            if row.len() != parameters {
                return Err(Error::InvalidDimension(format!(
                    "row {i} has {} input parameters, expected {parameters}",
                    row.len()
                )));
            }
            flat.extend(row);
        }

        Ok(Self {
            parameters,
            inputs: flat,
            responses,
        })
    }

    /// Creates an observation set from full rows whose last value is the response.
    ///
    /// # Errors
    /// - [`Error::NoData`] if there are no rows.
    /// - [`Error::InvalidDimension`] if a row has fewer than two values, or rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let mut inputs = Vec::with_capacity(rows.len());
        let mut responses = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            let Some(response) = row.pop() else {
                return Err(Error::InvalidDimension(format!("row {i} is empty")));
            };
            inputs.push(row);
            responses.push(response);
        }

        Self::new(inputs, responses)
    }

    /// Creates a single-parameter observation set from `(x, z)` pairs.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] if `points` is empty.
    pub fn from_pairs(points: &[(T, T)]) -> Result<Self> {
        let inputs = points.iter().map(|&(x, _)| vec![x]).collect();
        let responses = points.iter().map(|&(_, z)| z).collect();
        Self::new(inputs, responses)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Always false; an observation set holds at least one row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Number of input parameters per row.
    #[must_use]
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Input vector of row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn input(&self, i: usize) -> &[T] {
        &self.inputs[i * self.parameters..(i + 1) * self.parameters]
    }

    /// Response of row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn response(&self, i: usize) -> T {
        self.responses[i]
    }

    /// All responses, in row order.
    #[must_use]
    pub fn responses(&self) -> &[T] {
        &self.responses
    }

    /// Iterates over `(input, response)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (&[T], T)> + '_ {
        self.inputs
            .chunks_exact(self.parameters)
            .zip(self.responses.iter().copied())
    }

    /// Builds a new observation set from the given row indices, in the order given.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] if `indices` is empty.
    ///
    /// # Panics
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::NoData);
        }

        let mut inputs = Vec::with_capacity(indices.len() * self.parameters);
        let mut responses = Vec::with_capacity(indices.len());
        for &i in indices {
            inputs.extend_from_slice(self.input(i));
            responses.push(self.responses[i]);
        }

        Ok(Self {
            parameters: self.parameters,
            inputs,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_moves_last_column_to_response() {
        let data = Observations::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(data.parameters(), 2);
        assert_eq!(data.input(1), &[4.0, 5.0]);
        assert_eq!(data.responses(), &[3.0, 6.0]);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Observations::new(vec![vec![1.0, 2.0], vec![3.0]], vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension(_)));
    }

    #[test]
    fn test_rejects_empty_inputs() {
        assert!(matches!(
            Observations::<f64>::new(vec![], vec![]),
            Err(Error::NoData)
        ));
        assert!(matches!(
            Observations::new(vec![vec![]], vec![1.0]),
            Err(Error::InvalidDimension(_))
        ));
        assert!(matches!(
            Observations::from_rows(vec![vec![1.0]]),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn test_rejects_response_count_mismatch() {
        let err = Observations::new(vec![vec![1.0], vec![2.0]], vec![0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension(_)));
    }

    #[test]
    fn test_select_keeps_given_order() {
        let data = Observations::from_pairs(&[(0.0, 10.0), (1.0, 11.0), (2.0, 12.0)]).unwrap();
        let subset = data.select(&[2, 0]).unwrap();
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.input(0), &[2.0]);
        assert_eq!(subset.responses(), &[12.0, 10.0]);
        assert!(matches!(data.select(&[]), Err(Error::NoData)));
    }

    #[test]
    fn test_iter_pairs_rows() {
        let data = Observations::from_pairs(&[(0.0, 1.0), (1.0, 2.0)]).unwrap();
        let rows: Vec<_> = data.iter().collect();
        assert_eq!(rows, vec![(&[0.0][..], 1.0), (&[1.0][..], 2.0)]);
    }
}
