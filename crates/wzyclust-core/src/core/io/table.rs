use crate::core::models::table::{Table, TableError};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Loads delimited feature tables (one row per protein, one column per annotation).
pub struct TableFile;

impl TableFile {
    /// Reads a comma-separated table with a header row.
    pub fn read_from(reader: impl Read) -> Result<Table, TableError> {
        Self::read_delimited(reader, b',')
    }

    /// Reads a table using an arbitrary single-byte delimiter (e.g. `b'\t'`).
    pub fn read_delimited(reader: impl Read, delimiter: u8) -> Result<Table, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let table = Table::from_rows(headers, rows)?;
        debug!(
            "Loaded table with {} rows and {} columns",
            table.num_rows(),
            table.num_columns()
        );
        Ok(table)
    }

    /// Reads a table from disk; `.tsv` and `.tab` files are tab-delimited.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
        let path = path.as_ref();
        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => {
                b'\t'
            }
            _ => b',',
        };
        let file = std::fs::File::open(path)?;
        Self::read_delimited(std::io::BufReader::new(file), delimiter)
    }
}
