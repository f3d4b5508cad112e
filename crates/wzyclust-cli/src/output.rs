use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use serde::Serialize;
use std::io::Write;

const COLUMN_GAP: &str = "  ";

/// Header plus rows of string cells; the shape shared by text and CSV output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Flattens serialisable rows through the CSV serializer, so that the column
    /// names and order follow the struct fields.
    pub fn from_records<T: Serialize>(records: &[T]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record).map_err(csv_error)?;
        }
        let data = writer
            .into_inner()
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to buffer CSV output: {}", e)))?;

        let mut reader = csv::Reader::from_reader(data.as_slice());
        let headers = if records.is_empty() {
            Vec::new()
        } else {
            reader
                .headers()
                .map_err(csv_error)?
                .iter()
                .map(str::to_string)
                .collect()
        };
        let rows = reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, _>>()
            .map_err(csv_error)?;
        Ok(Self { headers, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, out: &mut impl Write) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.headers).map_err(csv_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Left-aligned columns with numbers rounded for reading.
    pub fn write_text(&self, out: &mut impl Write) -> Result<()> {
        if self.rows.is_empty() {
            writeln!(out, "(no rows)")?;
            return Ok(());
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| format_cell(c)).collect())
            .collect();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_text_line(out, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_text_line(out, &rule, &widths)?;
        for row in &cells {
            write_text_line(out, row, &widths)?;
        }
        Ok(())
    }

    pub fn write(&self, format: OutputFormat, out: &mut impl Write) -> Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out),
            OutputFormat::Csv => self.write_csv(out),
            OutputFormat::Json => Err(CliError::Argument(
                "JSON output is written from the result rows, not from a text table".to_string(),
            )),
        }
    }
}

fn write_text_line(out: &mut impl Write, cells: &[String], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

fn format_cell(cell: &str) -> String {
    if cell.parse::<i64>().is_ok() {
        return cell.to_string();
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_nan() => "NaN".to_string(),
        Ok(v) if v.is_infinite() => if v > 0.0 { "inf" } else { "-inf" }.to_string(),
        Ok(v) if v != 0.0 && v.abs() < 1e-3 => format!("{:.3e}", v),
        Ok(v) => format!("{:.4}", v),
        Err(_) => cell.to_string(),
    }
}

fn csv_error(e: csv::Error) -> CliError {
    CliError::Other(anyhow::anyhow!("Failed to format output: {}", e))
}

pub fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to format JSON output: {}", e)))?;
    writeln!(out)?;
    Ok(())
}

/// Writes serialisable result rows in the requested format.
pub fn write_records<T: Serialize>(
    records: &[T],
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(records, out),
        _ => TextTable::from_records(records)?.write(format, out),
    }
}
