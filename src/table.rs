//! Named numeric tables, read from and written to CSV
//!
//! Training tables carry the input parameters and one response column. [`Table::split_response`]
//! moves the response to the final position and turns the rest into [`Observations`].
//!
//! Evaluation tables carry only the input parameters, in the same order as training.
//! [`evaluate_model`] writes them back out with one appended column of predictions.
use std::{io, path::Path};

use crate::{
    error::{Error, Result, Stage},
    model::SurrogateModel,
    observations::Observations,
};

/// Rows of numbers under a header of column names.
///
/// # Example
/// ```rust
/// use polysurrogate::table::Table;
///
/// let csv = "x,z,y\n1,10,2\n3,30,4\n";
/// let table = Table::from_reader(csv.as_bytes()).unwrap();
///
/// let (inputs, data) = table.split_response("z").unwrap();
/// assert_eq!(inputs, vec!["x", "y"]);
/// assert_eq!(data.input(1), &[3.0, 4.0]);
/// assert_eq!(data.response(1), 30.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
}
impl Table {
    /// Creates a table from column names and rows.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if a row does not have one value per column.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headers.len())
        {
            return Err(Error::InvalidDimension(format!(
                "row {} has {} values for {} columns",
                i + 1,
                row.len(),
                headers.len()
            )));
        }

        Ok(Self { headers, rows })
    }

    /// Loads a table from a CSV file with a header row.
    ///
    /// # Errors
    /// Any error of [`Table::from_reader`], or an I/O error opening the file, in the `Reading` stage.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading table from {}", path.display());

        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Error::from(e).in_stage(Stage::Reading))?;
        Self::from_csv(reader).map_err(|e| e.in_stage(Stage::Reading))
    }

    /// Loads a table from CSV text with a header row.
    ///
    /// Surrounding whitespace is ignored. Every cell must parse as a number.
    ///
    /// # Errors
    /// - [`Error::Csv`] if the text is not valid CSV, or rows differ in length.
    /// - [`Error::ParseValue`] if a cell is not a number.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .zip(&headers)
                .map(|(cell, column)| {
                    cell.parse::<f64>().map_err(|_| Error::ParseValue {
                        row: i + 1,
                        column: column.clone(),
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        Self::new(headers, rows)
    }

    /// Column names, in order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Position of the named column.
    ///
    /// # Errors
    /// Returns [`Error::MissingColumn`] if there is no such column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Builds a new table with only the named columns, in the order given.
    ///
    /// # Errors
    /// Returns [`Error::MissingColumn`] if a name is not a column of this table.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            headers: indices.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
        })
    }

    /// Builds a new table with the named column moved to the final position.
    ///
    /// # Errors
    /// Returns [`Error::MissingColumn`] if there is no such column.
    pub fn with_column_last(&self, name: &str) -> Result<Self> {
        let index = self.column_index(name)?;
        let mut order: Vec<usize> = (0..self.width()).filter(|&i| i != index).collect();
        order.push(index);

        let names: Vec<&str> = order.iter().map(|&i| self.headers[i].as_str()).collect();
        self.select_columns(&names)
    }

    /// Builds a new table with one more column on the right.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimension`] if there is not one value per row.
    pub fn with_column(&self, name: &str, values: &[f64]) -> Result<Self> {
        if values.len() != self.len() {
            return Err(Error::InvalidDimension(format!(
                "column `{name}` has {} values for {} rows",
                values.len(),
                self.len()
            )));
        }

        let mut headers = self.headers.clone();
        headers.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, &v)| {
                let mut row = row.clone();
                row.push(v);
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Splits a training table into input column names and observations.
    ///
    /// The response column is moved to the final position and every other column becomes an
    /// input parameter, in table order.
    ///
    /// # Errors
    /// - [`Error::MissingColumn`] if there is no response column.
    /// - [`Error::NoData`] if the table has no rows.
    /// - [`Error::InvalidDimension`] if the response is the only column.
    pub fn split_response(&self, response: &str) -> Result<(Vec<String>, Observations<f64>)> {
        let ordered = self.with_column_last(response)?;
        let mut inputs = ordered.headers;
        inputs.pop();

        let observations = Observations::from_rows(ordered.rows)?;
        Ok((inputs, observations))
    }

    /// Writes the table as CSV with a header row.
    ///
    /// # Errors
    /// Returns [`Error::Csv`] if writing fails.
    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(f64::to_string))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the table to a CSV file, replacing it if it exists.
    ///
    /// # Errors
    /// Returns [`Error::Csv`] in the `Writing` stage if the file cannot be written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("writing {} rows to {}", self.len(), path.display());

        let file = std::fs::File::create(path).map_err(|e| Error::from(e).in_stage(Stage::Writing))?;
        self.to_writer(io::BufWriter::new(file))
            .map_err(|e| e.in_stage(Stage::Writing))
    }
}

/// Evaluates the model on every row of an evaluation table.
///
/// Columns are used positionally, in the same order as the training inputs.
///
/// # Errors
/// Returns [`Error::InvalidDimension`] in the `Evaluation` stage if the table does not have one
/// column per model parameter.
pub fn predictions(table: &Table, model: &SurrogateModel<f64>) -> Result<Vec<f64>> {
    if table.width() != model.parameters() {
        return Err(Error::InvalidDimension(format!(
            "evaluation table has {} columns, the model expects {}",
            table.width(),
            model.parameters()
        ))
        .in_stage(Stage::Evaluation));
    }

    table
        .rows()
        .iter()
        .map(|row| model.y(row))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.in_stage(Stage::Evaluation))
}

/// Evaluates the model on every row of an evaluation table and writes the table, plus one
/// `response_name` column of predictions, as CSV.
///
/// Row order and every input column are preserved. `table` is not modified.
///
/// # Errors
/// - See [`predictions`].
/// - [`Error::Csv`] in the `Writing` stage if writing fails.
pub fn write_predictions<W: io::Write>(
    table: &Table,
    model: &SurrogateModel<f64>,
    response_name: &str,
    writer: W,
) -> Result<()> {
    let output = table
        .with_column(response_name, &predictions(table, model)?)
        .map_err(|e| e.in_stage(Stage::Evaluation))?;
    output
        .to_writer(writer)
        .map_err(|e| e.in_stage(Stage::Writing))
}

/// Evaluates the model on every row of an evaluation table and writes the result to
/// `output_path`.
///
/// See [`write_predictions`].
///
/// # Errors
/// See [`write_predictions`]; failing to create the file is an [`Error::Io`] in the `Writing` stage.
pub fn evaluate_model(
    table: &Table,
    model: &SurrogateModel<f64>,
    response_name: &str,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let output = table
        .with_column(response_name, &predictions(table, model)?)
        .map_err(|e| e.in_stage(Stage::Evaluation))?;
    output.write_csv(output_path)?;

    log::info!(
        "wrote {} predictions to {}",
        output.len(),
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn model() -> SurrogateModel<f64> {
        // z = 1 + 2a + 3b
        SurrogateModel::from_coefficients(2, 1, vec![1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn test_reads_and_trims() {
        let table = Table::from_reader(" a , b \n 1.5 , -2 \n3,4e2\n".as_bytes()).unwrap();
        assert_eq!(table.headers(), &["a", "b"]);
        assert_eq!(table.rows(), &[vec![1.5, -2.0], vec![3.0, 400.0]]);
    }

    #[test]
    fn test_rejects_non_numeric_cells() {
        let err = Table::from_reader("a,b\n1,2\n3,oops\n".as_bytes()).unwrap_err();
        match err {
            Error::ParseValue { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "b");
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Table::from_reader("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Csv);
    }

    #[test]
    fn test_split_response_moves_column_last() {
        let table = Table::from_reader("z,a,b\n6,1,1\n1,0,0\n".as_bytes()).unwrap();
        let (inputs, data) = table.split_response("z").unwrap();
        assert_eq!(inputs, vec!["a", "b"]);
        assert_eq!(data.input(0), &[1.0, 1.0]);
        assert_eq!(data.responses(), &[6.0, 1.0]);

        assert_eq!(
            table.split_response("missing").unwrap_err().kind(),
            ErrorKind::MissingColumn
        );

        let empty = Table::from_reader("a,z\n".as_bytes()).unwrap();
        assert_eq!(empty.split_response("z").unwrap_err().kind(), ErrorKind::NoData);
    }

    #[test]
    fn test_select_columns() {
        let table = Table::from_reader("a,b,c\n1,2,3\n".as_bytes()).unwrap();
        let picked = table.select_columns(&["c", "a"]).unwrap();
        assert_eq!(picked.headers(), &["c", "a"]);
        assert_eq!(picked.rows(), &[vec![3.0, 1.0]]);
        assert!(table.select_columns(&["d"]).is_err());
    }

    #[test]
    fn test_write_predictions_preserves_rows() {
        let table = Table::from_reader("a,b\n0,0\n1,0\n0,1\n2,2\n".as_bytes()).unwrap();
        let before = table.clone();

        let mut out = Vec::new();
        write_predictions(&table, &model(), "sm", &mut out).unwrap();
        assert_eq!(table, before);

        let written = Table::from_reader(out.as_slice()).unwrap();
        assert_eq!(written.headers(), &["a", "b", "sm"]);
        assert_eq!(written.len(), 4);
        assert_eq!(
            written.rows(),
            &[
                vec![0.0, 0.0, 1.0],
                vec![1.0, 0.0, 3.0],
                vec![0.0, 1.0, 4.0],
                vec![2.0, 2.0, 11.0]
            ]
        );
    }

    #[test]
    fn test_evaluate_model_round_trip() {
        let mut input = NamedTempFile::new().expect("temp file");
        writeln!(input, "a,b").expect("write header");
        writeln!(input, "0.5,0.25").expect("write row");
        writeln!(input, "-1,3").expect("write row");
        let table = Table::read_csv(input.path()).unwrap();

        let output = NamedTempFile::new().expect("temp file");
        evaluate_model(&table, &model(), "z", output.path()).unwrap();

        let written = Table::read_csv(output.path()).unwrap();
        assert_eq!(written.headers(), &["a", "b", "z"]);
        assert_eq!(written.rows()[0], vec![0.5, 0.25, 2.75]);
        assert_eq!(written.rows()[1], vec![-1.0, 3.0, 8.0]);
    }

    #[test]
    fn test_evaluate_model_checks_width() {
        let table = Table::from_reader("a\n1\n".as_bytes()).unwrap();
        let output = NamedTempFile::new().expect("temp file");
        let err = evaluate_model(&table, &model(), "z", output.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimension);
        assert_eq!(err.stage(), Some(Stage::Evaluation));
    }

    #[test]
    fn test_missing_file_is_reading_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = Table::read_csv(dir.path().join("absent.csv")).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Reading));
    }
}
