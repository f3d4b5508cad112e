use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),
    #[error("Row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),
    #[error("Invalid numeric value '{value}' in column '{column}' at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
}

/// Cell texts read as missing, matched case-sensitively (the pandas `read_csv` defaults).
const MISSING_MARKERS: [&str; 18] = [
    "-1.#IND", "1.#QNAN", "1.#IND", "-1.#QNAN", "#N/A N/A", "#N/A", "N/A", "n/a", "NA",
    "<NA>", "#NA", "NULL", "null", "NaN", "-NaN", "nan", "-nan", "None",
];

/// Returns `true` for cells that represent a missing observation.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

/// Column-oriented table of text cells; missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    index: HashMap<String, usize>,
    num_rows: usize,
}

impl Table {
    /// Builds a table from a header row and raw row-major records.
    ///
    /// Cells are trimmed; cells recognised by [`is_missing`] become `None`.
    /// Rows are 1-based in error messages, counting the header as row 0.
    pub fn from_rows<R, C>(headers: Vec<String>, rows: R) -> Result<Self, TableError>
    where
        R: IntoIterator<Item = Vec<C>>,
        C: AsRef<str>,
    {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, name) in headers.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut num_rows = 0;
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(TableError::RaggedRow {
                    row: row_idx + 1,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row.iter()) {
                let cell = cell.as_ref();
                column.push((!is_missing(cell)).then(|| cell.trim().to_string()));
            }
            num_rows += 1;
        }

        Ok(Self {
            headers,
            columns,
            index,
            num_rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&[Option<String>], TableError> {
        self.index
            .get(name)
            .map(|&i| self.columns[i].as_slice())
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Parses a column as floating point values, keeping missing cells as `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, TableError> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                None => Ok(None),
                Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
                    TableError::InvalidNumber {
                        column: name.to_string(),
                        row: row + 1,
                        value: text.clone(),
                    }
                }),
            })
            .collect()
    }
}
